#![cfg(target_arch = "wasm32")]

use echo_maze::storage::{BrowserStore, KeyValueStore, load_flag, save_flag};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_round_trips_and_removes() {
    let mut store = BrowserStore::open().expect("localStorage");
    save_flag(&mut store, "echomaze_test_flag", true);
    assert_eq!(load_flag(&store, "echomaze_test_flag"), Some(true));

    store.remove("echomaze_test_flag");
    assert_eq!(store.get("echomaze_test_flag"), None);
    // removing a missing key is a quiet no-op
    store.remove("echomaze_test_flag");
    assert_eq!(load_flag(&store, "echomaze_test_flag"), None);
}
