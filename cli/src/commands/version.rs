//! Version command

use serde_json::json;

/// Run the version command.
pub fn run(json: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if json {
        println!("{}", json!({ "name": "slotup", "version": version }));
    } else {
        println!("slotup {version}");
    }
}
