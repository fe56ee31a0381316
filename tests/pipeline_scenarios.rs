// tests/pipeline_scenarios.rs
// Hand-picked end-to-end scenarios for the related posts pipeline.
// Self-contained: catalogs are built inline, time is fixed.

use chrono::{DateTime, TimeZone, Utc};
use related_posts::{
    run, Catalog, Device, PipelineSettings, Post, PriorityTier, RenderOutcome, StaticEnvironment,
    SuppressReason, Topic,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 18, 9, 30, 0).unwrap()
}

fn eval(catalog: &Catalog, location: &str, width: u32) -> RenderOutcome {
    let env = StaticEnvironment::new(location, width, now());
    run(catalog, &env, &PipelineSettings::default())
}

fn titles(out: &RenderOutcome) -> Vec<&str> {
    out.posts().iter().map(|p| p.title.as_str()).collect()
}

#[test]
fn saddle_url_matches_product_topic_only() {
    let catalog = Catalog {
        topics: vec![
            Topic::new("B17", PriorityTier::Product)
                .keywords(["saddle"])
                .post(Post::new("B17", "/b17")),
            Topic::new("Gravel", PriorityTier::ProductCategory)
                .keywords(["gravel"])
                .post(Post::new("GravelGuide", "/gravel")),
        ],
        priority_posts: vec![],
    };

    let out = eval(&catalog, "/products/b17-saddle?x=1", 1200);
    match &out {
        RenderOutcome::Render { device, posts } => {
            assert_eq!(*device, Device::Desktop);
            assert_eq!(posts.len(), 1);
            assert_eq!(posts[0].title, "B17");
        }
        other => panic!("expected render, got {other:?}"),
    }
}

#[test]
fn future_post_alone_suppresses_panel() {
    let catalog = Catalog {
        topics: vec![Topic::new("Launch", PriorityTier::Product)
            .keywords(["launch"])
            .post(Post::new("Launch", "/launch").with_start_date("2999-01-01"))],
        priority_posts: vec![],
    };
    let out = eval(&catalog, "/launch-event", 1200);
    assert_eq!(out.suppress_reason(), Some(SuppressReason::NothingAssembled));
}

#[test]
fn duplicate_title_across_tiers_keeps_higher_tier_copy() {
    let catalog = Catalog {
        topics: vec![
            // configured first but lower priority, so it must not win
            Topic::new("B", PriorityTier::Brand)
                .keywords(["brooks"])
                .post(Post::new("X", "/from-b")),
            Topic::new("A", PriorityTier::Product)
                .keywords(["b17"])
                .post(Post::new("X", "/from-a")),
        ],
        priority_posts: vec![],
    };
    let out = eval(&catalog, "/brooks/b17", 1200);
    assert_eq!(titles(&out), vec!["X"]);
    assert_eq!(out.posts()[0].url, "/from-a");
}

#[test]
fn mobile_cap_takes_first_six_in_priority_order() {
    let mut a = Topic::new("A", PriorityTier::Product).keywords(["bike"]);
    for i in 0..5 {
        a = a.post(Post::new(format!("a{i}"), format!("/a{i}")));
    }
    let mut b = Topic::new("B", PriorityTier::Sport).keywords(["road"]);
    for i in 0..3 {
        b = b.post(Post::new(format!("b{i}"), format!("/b{i}")));
    }
    let catalog = Catalog {
        topics: vec![b, a],
        priority_posts: vec![],
    };

    let out = eval(&catalog, "/road-bike", 800);
    match &out {
        RenderOutcome::Render { device, .. } => assert_eq!(*device, Device::Mobile),
        other => panic!("expected render, got {other:?}"),
    }
    assert_eq!(titles(&out), vec!["a0", "a1", "a2", "a3", "a4", "b0"]);
}

#[test]
fn pinned_posts_do_not_render_without_match() {
    let catalog = Catalog {
        topics: vec![Topic::new("A", PriorityTier::Product)
            .keywords(["saddle"])
            .post(Post::new("S", "/s"))],
        priority_posts: vec![Post::new("Pinned", "/pinned")],
    };
    let out = eval(&catalog, "/checkout", 1200);
    assert_eq!(out.suppress_reason(), Some(SuppressReason::NoTopicMatch));
}

#[test]
fn only_pinned_surviving_is_suppressed() {
    let catalog = Catalog {
        topics: vec![Topic::new("A", PriorityTier::Product)
            .keywords(["saddle"])
            .post(Post::new("Old", "/old").inactive())
            .post(Post::new("Pinned", "/dup-of-pinned"))],
        priority_posts: vec![Post::new("Pinned", "/pinned")],
    };
    let out = eval(&catalog, "/saddle", 1200);
    assert_eq!(out.suppress_reason(), Some(SuppressReason::PinnedOnly));
}

#[test]
fn duplicate_pinned_titles_do_not_hide_topic_posts() {
    let catalog = Catalog {
        topics: vec![Topic::new("A", PriorityTier::Product)
            .keywords(["saddle"])
            .post(Post::new("Fresh topic post", "/fresh"))],
        priority_posts: vec![Post::new("Sale", "/sale-1"), Post::new("Sale", "/sale-2")],
    };
    let out = eval(&catalog, "/saddle", 1200);
    assert!(out.is_rendered(), "got {out:?}");
    assert_eq!(titles(&out), vec!["Sale", "Fresh topic post"]);
    assert_eq!(out.posts()[0].url, "/sale-1");
}

#[test]
fn duplicate_pinned_titles_alone_are_suppressed() {
    let catalog = Catalog {
        topics: vec![Topic::new("A", PriorityTier::Product)
            .keywords(["saddle"])
            .post(Post::new("Sale", "/topic-sale"))],
        priority_posts: vec![Post::new("Sale", "/sale-1"), Post::new("Sale", "/sale-2")],
    };
    let out = eval(&catalog, "/saddle", 1200);
    assert_eq!(out.suppress_reason(), Some(SuppressReason::PinnedOnly));
}

#[test]
fn pinned_lead_and_keep_their_fields() {
    let catalog = Catalog {
        topics: vec![Topic::new("A", PriorityTier::Product)
            .keywords(["saddle"])
            .post(Post::new("Sale", "/topic-sale"))
            .post(Post::new("Care", "/care"))],
        priority_posts: vec![Post::new("Sale", "/pinned-sale")],
    };
    let out = eval(&catalog, "/saddle", 1200);
    assert_eq!(titles(&out), vec!["Sale", "Care"]);
    assert_eq!(out.posts()[0].url, "/pinned-sale");
}

#[test]
fn absolute_href_ignores_host_keywords() {
    let catalog = Catalog {
        topics: vec![Topic::new("Shop", PriorityTier::Brand)
            .keywords(["shop"])
            .post(Post::new("Shop news", "/news"))],
        priority_posts: vec![],
    };
    let out = eval(&catalog, "https://shop.example.com/about", 1200);
    assert_eq!(out.suppress_reason(), Some(SuppressReason::NoTopicMatch));
    let out = eval(&catalog, "https://shop.example.com/about?ref=SHOP", 1200);
    assert!(out.is_rendered());
}

#[test]
fn bundled_catalog_renders_for_b17_page() {
    let catalog = Catalog::load_from_file("config/catalog.json").expect("bundled catalog");
    let out = eval(&catalog, "/products/brooks-b17-saddle", 1440);
    assert_eq!(
        titles(&out),
        vec![
            "Winter sale",
            "Breaking in your B17",
            "Saddle care 101",
            "Inside the Smethwick workshop",
            "Choosing a leather saddle",
            "Cambium vs leather",
        ]
    );
}
