use blogstore_core::{
    BlogPost, Keyword, ModelValidationError, PostRepository, RepoError, RepoResult, Store,
    StoreConfig, User, UserRepository,
};
use chrono::NaiveDate;

fn open_store() -> Store {
    Store::open(&StoreConfig::in_memory()).unwrap()
}

fn add_wendy(store: &mut Store) -> User {
    store
        .session_scope(|session| -> RepoResult<_> {
            let mut wendy = User::new("wendy", "Wendy Williams", "windy");
            session.users().add_user(&mut wendy)?;
            Ok(wendy)
        })
        .unwrap()
}

#[test]
fn post_with_keywords_is_queryable_from_both_sides() {
    let mut store = open_store();
    let wendy = add_wendy(&mut store);

    let post_id = store
        .session_scope(|session| -> RepoResult<_> {
            let author = session.users().one_by_name("wendy")?;
            let mut post = BlogPost::new("Wendy's Blog Post", "This is a test", &author);
            post.add_keyword(Keyword::new("wendy"));
            post.add_keyword(Keyword::new("firstpost"));
            session.posts().add_post(&mut post)
        })
        .unwrap();

    store
        .session_scope(|session| -> RepoResult<()> {
            let posts = session.posts();

            let tagged = posts.posts_with_keyword("firstpost")?;
            assert_eq!(tagged.len(), 1);
            assert_eq!(tagged[0].headline, "Wendy's Blog Post");
            assert_eq!(tagged[0].user_id, wendy.id);
            let keywords: Vec<_> = tagged[0].keywords.iter().map(|k| k.keyword.as_str()).collect();
            assert_eq!(keywords, vec!["wendy", "firstpost"]);

            assert!(posts.posts_with_keyword("secondpost")?.is_empty());
            assert_eq!(posts.count_posts()?, 1);

            let firstpost = posts.find_keyword("firstpost")?.unwrap();
            let back = posts.posts_for_keyword(firstpost.id.unwrap())?;
            assert_eq!(back.len(), 1);
            assert_eq!(back[0].id, Some(post_id));
            Ok(())
        })
        .unwrap();
}

#[test]
fn duplicate_keyword_string_is_a_constraint_violation() {
    let mut store = open_store();

    let err = store
        .session_scope(|session| -> RepoResult<()> {
            let posts = session.posts();
            posts.add_keyword(&mut Keyword::new("firstpost"))?;
            posts.add_keyword(&mut Keyword::new("firstpost"))?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, RepoError::Constraint(_)));
}

#[test]
fn duplicate_association_pair_is_a_constraint_violation() {
    let mut store = open_store();
    let wendy = add_wendy(&mut store);

    let err = store
        .session_scope(|session| -> RepoResult<()> {
            let posts = session.posts();
            let mut keyword = Keyword::new("wendy");
            let keyword_id = posts.add_keyword(&mut keyword)?;
            let post_id = posts.add_post(&mut BlogPost::new("Post", "body", &wendy))?;
            posts.attach_keyword(post_id, keyword_id)?;
            posts.attach_keyword(post_id, keyword_id)?;
            Ok(())
        })
        .unwrap_err();

    assert!(err.is_constraint_violation());
}

#[test]
fn existing_keyword_is_reused_across_posts() {
    let mut store = open_store();
    let wendy = add_wendy(&mut store);

    store
        .session_scope(|session| -> RepoResult<()> {
            let posts = session.posts();
            let mut shared = Keyword::new("shared");
            posts.add_keyword(&mut shared)?;

            for headline in ["one", "two"] {
                let mut post = BlogPost::new(headline, "body", &wendy);
                post.add_keyword(shared.clone());
                posts.add_post(&mut post)?;
            }

            let tagged = posts.posts_for_keyword(shared.id.unwrap())?;
            let headlines: Vec<_> = tagged.iter().map(|p| p.headline.as_str()).collect();
            assert_eq!(headlines, vec!["one", "two"]);
            Ok(())
        })
        .unwrap();
}

#[test]
fn post_date_round_trips_and_delete_drops_associations() {
    let mut store = open_store();
    let wendy = add_wendy(&mut store);
    let date = NaiveDate::from_ymd_opt(2019, 8, 1).unwrap();

    let post_id = store
        .session_scope(|session| -> RepoResult<_> {
            let mut post = BlogPost::new("Dated", "body", &wendy).with_date(date);
            post.add_keyword(Keyword::new("dated"));
            session.posts().add_post(&mut post)
        })
        .unwrap();

    store
        .session_scope(|session| -> RepoResult<()> {
            let posts = session.posts();
            let loaded = posts.get_post(post_id)?.unwrap();
            assert_eq!(loaded.date, Some(date));

            posts.delete_post(post_id)?;
            assert!(posts.get_post(post_id)?.is_none());
            let links: i64 = session.connection().query_row(
                "SELECT COUNT(*) FROM post_keywords;",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(links, 0);
            // The keyword itself survives.
            assert!(posts.find_keyword("dated")?.is_some());
            Ok(())
        })
        .unwrap();
}

#[test]
fn overlong_headline_is_rejected() {
    let mut store = open_store();
    let wendy = add_wendy(&mut store);

    let err = store
        .session_scope(|session| -> RepoResult<_> {
            session
                .posts()
                .add_post(&mut BlogPost::new("h".repeat(300), "body", &wendy))
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn post_with_unsaved_author_is_rejected_before_insert() {
    let mut store = open_store();
    let wendy = User::new("wendy", "Wendy Williams", "windy");

    let err = store
        .session_scope(|session| -> RepoResult<_> {
            session
                .posts()
                .add_post(&mut BlogPost::new("Orphan draft", "body", &wendy))
        })
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::UnsavedReference("author"))
    ));

    let posts: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM posts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(posts, 0);
}
