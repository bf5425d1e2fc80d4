use std::rc::Rc;

use smart_rewriter::config::{Configuration, DEFAULT_ENDPOINT, DEFAULT_MODEL, keys};
use smart_rewriter::field::tagger::FieldRule;
use smart_rewriter::store::{JsonFileStore, KeyValueStore, MemoryStore, get_json, set_json};

// ============================================================================
// Stores
// ============================================================================

#[test]
fn memory_store_round_trips_json() {
    let store = MemoryStore::new();
    set_json(&store, "list", &vec!["a", "b"]).unwrap();
    let list: Vec<String> = get_json(&store, "list").unwrap();
    assert_eq!(list, vec!["a", "b"]);
    assert!(get_json::<bool>(&store, "missing").is_none());
}

#[test]
fn file_store_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let store = JsonFileStore::open(&path);
    store.set(keys::SELECTED_MODEL, "mistral").unwrap();
    set_json(&store, keys::DEBUG, &true).unwrap();
    assert!(path.exists());

    let reopened = JsonFileStore::open(&path);
    assert_eq!(reopened.get(keys::SELECTED_MODEL).as_deref(), Some("mistral"));
    assert_eq!(get_json::<bool>(&reopened, keys::DEBUG), Some(true));
}

#[test]
fn corrupt_file_store_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ definitely not json").unwrap();

    let store = JsonFileStore::open(&path);
    assert!(store.get(keys::ENABLED).is_none());
    store.set(keys::ENABLED, "false").unwrap();
    assert_eq!(JsonFileStore::open(&path).get(keys::ENABLED).as_deref(), Some("false"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn empty_store_gives_defaults() {
    let config = Configuration::load(&MemoryStore::new());
    assert!(config.enabled);
    assert_eq!(config.endpoint_url, DEFAULT_ENDPOINT);
    assert_eq!(config.selected_model, DEFAULT_MODEL);
    assert_eq!(config.default_mode.as_deref(), Some("casual"));
    assert!(!config.debug);
    assert_eq!(config.keyboard_shortcut, "Alt+R");
    assert_eq!(config.grace_delay_ms, 200);
}

#[test]
fn corrupt_values_fall_back_individually() {
    let store = MemoryStore::with_values([
        (keys::ENABLED, "yes please"),
        (keys::DEBUG, "true"),
        (keys::EXCLUDED_TAGS, "[{"),
        (keys::SELECTED_MODEL, "mistral"),
    ]);
    let config = Configuration::load(&store);

    assert!(config.enabled);
    assert!(config.debug);
    assert!(config.excluded_tags.is_empty());
    assert_eq!(config.selected_model, "mistral");
}

#[test]
fn save_then_load_round_trips() {
    let store = Rc::new(MemoryStore::new());
    let config = Configuration {
        enabled: false,
        endpoint_url: "http://gpu-box:11434/api/generate".to_string(),
        selected_model: "phi3".to_string(),
        default_mode: Some("academic".to_string()),
        debug: true,
        models: vec!["phi3".to_string()],
        excluded_tags: vec![FieldRule {
            id: Some("search".to_string()),
            ..FieldRule::default()
        }],
        grace_delay_ms: 350,
        ..Configuration::default()
    };

    config.save(store.as_ref()).unwrap();
    assert_eq!(Configuration::load(store.as_ref()), config);
    assert_eq!(config.grace_delay().as_millis(), 350);
    assert_eq!(config.element_filter().excluded.len(), 1);
}
