//! File-driven routers (requires the `config` feature).

#![cfg(feature = "config")]

use ruta::prelude::*;
use ruta::{load_config, RouterConfig};

const SHOP: &str = r#"
route_mode: urlrewrite
base_path: /shop/
path_identifiers: [_controller, _action]
write_back: true
delimiter: "-"
pairs_identifier: _pairs
rules:
  - group: product/view
    rules: ["product/<id:\\d+>.html"]
  - group: catalog/list
    rules:
      - "list/<tags+,>/<*>"
      - "list/<tags+,>"
  - rules: "<_controller>/<_action>/<*>"
  - rules: "<_controller>/<_action>"
"#;

fn shop() -> Router {
    Router::from_config(&RouterConfig::from_yaml_str(SHOP).unwrap()).unwrap()
}

#[test]
fn configured_router_parses() {
    let router = shop();
    let mut request = Request::new("/shop/list/red,blue/size-10?page=2");

    let found = router.parse_into(None, &mut request).unwrap().unwrap();
    assert_eq!(found.group, "catalog/list");
    assert_eq!(request.query.get_array("tags").unwrap(), ["red", "blue"]);
    assert_eq!(request.query.get_str("size"), Some("10"));
    assert_eq!(request.query.get_str("page"), Some("2"));
}

#[test]
fn configured_router_builds() {
    let router = shop();
    assert_eq!(
        router
            .create_url("product/view", &Params::new().with("id", 5))
            .unwrap(),
        "/shop/product/5.html"
    );
    assert_eq!(
        router
            .create_url("catalog/list", &Params::new().with("tags", ["red"]))
            .unwrap(),
        "/shop/list/red"
    );
    assert_eq!(
        router
            .create_url("news/list", &Params::new().with("page", 2))
            .unwrap(),
        "/shop/news/list/page-2"
    );
}

#[test]
fn unnamed_entries_merge_into_root() {
    let router = shop();
    let groups = router.table().compile().unwrap();
    let root = groups.iter().find(|g| g.name() == "*").unwrap();
    assert_eq!(root.rules().len(), 2);
}

#[test]
fn json_file_round_trip() {
    let config = RouterConfig::from_yaml_str(SHOP).unwrap();
    let path = std::env::temp_dir().join(format!("ruta-shop-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = load_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);
}
