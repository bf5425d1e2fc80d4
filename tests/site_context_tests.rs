use smart_rewriter::dom::document::Document;
use smart_rewriter::rewrite::site_context::{
    ContextPick, SiteContextExtractor, SiteStrategy, host_matches, hostname,
};

mod common;
use crate::common::utils::element;

fn with_text(doc: &mut Document, node: smart_rewriter::dom::document::NodeId, text: &str) {
    let t = doc.create_text(text);
    doc.append_child(node, t);
}

#[test]
fn hostnames_match_by_domain_suffix() {
    assert!(host_matches("twitter.com", "twitter.com"));
    assert!(host_matches("mobile.twitter.com", "twitter.com"));
    assert!(host_matches("Old.Reddit.com", "reddit.com"));
    assert!(!host_matches("mail.google.com.evil.example", "mail.google.com"));
    assert!(!host_matches("notreddit.com", "reddit.com"));
    assert!(!host_matches("x.com", ""));
}

#[test]
fn hostname_is_extracted_from_urls() {
    assert_eq!(hostname("https://X.com/a/status/1").as_deref(), Some("x.com"));
    assert_eq!(hostname("mail.google.com").as_deref(), Some("mail.google.com"));
    assert_eq!(hostname("").as_deref(), None);
}

#[test]
fn first_matching_strategy_wins() {
    let sites = SiteContextExtractor::new(vec![
        SiteStrategy::new("example.com", ".a", ContextPick::Last),
        SiteStrategy::new("blog.example.com", ".b", ContextPick::Last),
    ]);
    let strategy = sites.strategy_for("https://blog.example.com/").unwrap();
    assert_eq!(strategy.context_selector, ".a");
    assert!(sites.strategy_for("https://other.org/").is_none());
}

#[test]
fn twitter_uses_last_tweet_and_limit() {
    let mut doc = Document::new();
    let body = doc.body();
    for text in ["first tweet", "the one replied to"] {
        let tweet = element(&mut doc, body, "article", &[("data-testid", "tweet")]);
        with_text(&mut doc, tweet, text);
    }

    let context = SiteContextExtractor::builtin()
        .extract_context(&doc, "https://twitter.com/user/status/42");
    assert_eq!(context.context_text(), Some("the one replied to"));
    assert_eq!(context.character_limit, Some(280));
}

#[test]
fn reddit_uses_last_comment() {
    let mut doc = Document::new();
    let body = doc.body();
    let table = element(&mut doc, body, "div", &[("class", "sitetable nestedlisting")]);
    for text in ["top comment", "reply comment"] {
        let entry = element(&mut doc, table, "div", &[("class", "entry")]);
        let md = element(&mut doc, entry, "div", &[("class", "md")]);
        with_text(&mut doc, md, text);
    }

    let context = SiteContextExtractor::builtin()
        .extract_context(&doc, "https://old.reddit.com/r/rust/comments/1");
    assert_eq!(context.context_text(), Some("reply comment"));
    assert_eq!(context.character_limit, None);
}

#[test]
fn gmail_joins_every_message() {
    let mut doc = Document::new();
    let body = doc.body();
    for text in ["Hi there", "  ", "Any update?"] {
        let msg = element(&mut doc, body, "div", &[("class", "h7")]);
        with_text(&mut doc, msg, text);
    }

    let context =
        SiteContextExtractor::builtin().extract_context(&doc, "https://mail.google.com/mail/u/0");
    assert_eq!(context.context_text(), Some("Hi there\n\nAny update?"));
}

#[test]
fn unknown_site_or_no_matches_yield_nothing() {
    let mut doc = Document::new();
    let body = doc.body();
    let p = element(&mut doc, body, "p", &[]);
    with_text(&mut doc, p, "hello");

    let sites = SiteContextExtractor::builtin();
    assert_eq!(sites.extract_context(&doc, "https://example.com").context_text(), None);
    assert_eq!(sites.extract_context(&doc, "https://x.com/home").context_text(), None);
}
