use cbx_lib::analysis::detector::suppress_duplicates;
use cbx_lib::analysis::{
    ClusterableElement, DetectorConfig, FingerprintGenerator, SiteAggregator, SpacingSystemDetector,
    SpatialAnalyzer, VisualClusteringEngine, VisualFeatureVector,
};
use cbx_lib::{
    analyze_site, BoundingBox, DetectedComponent, DomTree, PageAnalyzer, PageCapture,
    VisualProperties,
};

fn bx(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
    BoundingBox::new(x, y, w, h).expect("valid box")
}

const BUTTON_STYLES: [(&str, &str); 4] = [
    ("background-color", "rgb(37, 99, 235)"),
    ("color", "rgb(255, 255, 255)"),
    ("padding", "8px 16px"),
    ("border-radius", "6px"),
];

// html0 head1 body2 button3 button4 button5 div6 img7 h3-8 p9
fn storefront(url: &str) -> PageCapture {
    let html = r#"<html><body>
        <button class="btn">Buy</button>
        <button class="btn">Save</button>
        <button class="btn">Share</button>
        <div class="card"><img src="p.png"><h3>Lamp</h3><p>Warm light</p></div>
    </body></html>"#;
    let mut capture = PageCapture::from_html(url, html);
    for (i, idx) in (3..=5).enumerate() {
        capture = capture
            .with_box(idx, bx(20.0 + i as f64 * 140.0, 20.0, 120.0, 40.0))
            .with_styles(idx, BUTTON_STYLES);
    }
    capture
        .with_box(6, bx(20.0, 100.0, 300.0, 400.0))
        .with_styles(6, [("box-shadow", "rgba(0, 0, 0, 0.1) 0px 4px 6px 0px")])
}

#[test]
fn two_by_two_grid_is_detected() {
    let boxes = [
        bx(0.0, 0.0, 100.0, 50.0),
        bx(300.0, 0.0, 100.0, 50.0),
        bx(0.0, 200.0, 100.0, 50.0),
        bx(300.0, 200.0, 100.0, 50.0),
    ];
    let arrangement = SpatialAnalyzer.analyze(&boxes);
    assert!(arrangement.is_grid);
    assert_eq!(arrangement.columns, 2);
    assert_eq!(arrangement.rows, 2);
}

#[test]
fn eight_point_samples_give_base_unit_eight() {
    let detector = SpacingSystemDetector::default();
    assert_eq!(detector.base_unit(&[8.0, 16.0, 24.0, 32.0, 40.0]), 8);
}

#[test]
fn identical_buttons_merge_into_one_aggregate() {
    let site = analyze_site(&PageAnalyzer::default(), &[storefront("https://shop.test/")]);
    let page = site.pages[0].analysis().expect("page analyzed");

    let buttons: Vec<&DetectedComponent> = page
        .components
        .iter()
        .filter(|c| c.component_type == "button")
        .collect();
    assert_eq!(buttons.len(), 3);
    assert!(buttons.iter().all(|b| b.hash() == buttons[0].hash()));

    let aggregate = site
        .aggregated
        .iter()
        .find(|a| a.component_type == "button")
        .expect("button aggregate");
    assert_eq!(aggregate.total_instances, 3);
    assert_eq!(
        site.aggregated
            .iter()
            .filter(|a| a.component_type == "button")
            .count(),
        1
    );
}

#[test]
fn image_heading_paragraph_box_is_a_card() {
    let site = analyze_site(&PageAnalyzer::default(), &[storefront("https://shop.test/")]);
    let page = site.pages[0].analysis().expect("page analyzed");
    let card = page
        .components
        .iter()
        .find(|c| c.dom_index == 6)
        .expect("card detected");
    assert_eq!(card.component_type, "card");
    assert!(card.confidence >= 0.65);
}

#[test]
fn containment_keeps_inner_component_of_same_type() {
    // html0 head1 body2 div3 div4
    let tree = DomTree::parse_html("<html><body><div><div>Inner</div></div></body></html>");
    let fingerprints = FingerprintGenerator::default();
    let make = |index: usize, bounds: BoundingBox| {
        let fp = fingerprints.generate(&tree, index).expect("fingerprint");
        let visual = VisualProperties::new(bounds, Default::default());
        DetectedComponent::new("card", 0.8, fp, visual, index, String::new())
    };
    let components = vec![
        make(3, bx(0.0, 0.0, 400.0, 400.0)),
        make(4, bx(10.0, 10.0, 200.0, 100.0)),
    ];

    let config = DetectorConfig::default();
    let once = suppress_duplicates(&tree, components, &config);
    assert_eq!(once.len(), 1);
    assert_eq!(once[0].dom_index, 4);

    let twice = suppress_duplicates(&tree, once.clone(), &config);
    assert_eq!(twice, once);
}

#[test]
fn single_page_aggregation_round_trips_group_counts() {
    let analyzer = PageAnalyzer::default();
    let page = analyzer
        .analyze(&storefront("https://shop.test/"))
        .expect("page analyzed");

    let mut aggregator = SiteAggregator::new();
    aggregator.add_page(&page.url, &page.groups);
    let aggregated = aggregator.finish();

    assert_eq!(aggregated.len(), page.groups.len());
    for group in &page.groups {
        let found = aggregated
            .iter()
            .find(|a| a.hash == group.key)
            .expect("group aggregated");
        assert_eq!(found.total_instances, group.instance_count);
        assert_eq!(found.page_count, 1);
    }
}

#[test]
fn clustering_is_deterministic_for_fixed_order() {
    let point = |id: &str, offset: f64| {
        let mut features = [0.1; 15];
        features[0] = offset;
        ClusterableElement {
            id: id.to_string(),
            component_type: "button".to_string(),
            bounds: bx(offset * 1000.0, 0.0, 100.0, 40.0),
            features: VisualFeatureVector(features),
        }
    };
    let points = vec![
        point("a", 0.10),
        point("b", 0.12),
        point("c", 0.14),
        point("d", 0.90),
        point("e", 0.92),
        point("f", 0.50),
    ];
    let engine = VisualClusteringEngine::default();
    let first = engine.cluster(&points);
    let second = engine.cluster(&points);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].member_ids, vec!["a", "b", "c"]);
    assert_eq!(first[1].member_ids, vec!["d", "e"]);
}

#[test]
fn fingerprint_similarity_is_symmetric_and_reflexive() {
    let tree = DomTree::parse_html(
        r#"<html><body>
            <div><img src="a.png"><h3>A</h3><p>x</p></div>
            <ul><li>One</li><li>Two</li></ul>
            <button>Go</button>
        </body></html>"#,
    );
    let generator = FingerprintGenerator::default();
    let fingerprints: Vec<_> = (2..tree.len())
        .filter_map(|i| generator.generate(&tree, i))
        .collect();
    assert!(fingerprints.len() >= 3);

    for a in &fingerprints {
        assert_eq!(a.similarity(a), 1.0);
        for b in &fingerprints {
            assert_eq!(a.similarity(b), b.similarity(a));
            if a.hash() == b.hash() {
                assert_eq!(a.similarity(b), 1.0);
            }
        }
    }
}
