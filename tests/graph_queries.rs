//! End-to-end tests for the graph, usage and reference operations.

mod common;

use cilquery::prelude::*;
use common::*;
use serde_json::{json, Value};

fn dispatcher() -> Dispatcher {
    Dispatcher::new(game_workspace())
}

fn ok(response: Option<Value>) -> Value {
    let response = response.expect("expected a response envelope");
    assert!(
        response.get("error").is_none(),
        "unexpected error: {response}"
    );
    response["result"].clone()
}

#[test]
fn derived_types_of_actor() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findDerivedTypes",
        "params": {"moduleMvid": game_mvid_text(), "typeToken": TOKEN_ACTOR},
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["fullName"], "Game.Player");
    assert_eq!(hits[0]["depth"], 1);

    // includeSelf reports the root at depth 0.
    let result = ok(dispatcher().handle_value(json!({
        "id": 2,
        "method": "findDerivedTypes",
        "params": {
            "moduleMvid": game_mvid_text(),
            "typeToken": TOKEN_ACTOR,
            "includeSelf": true,
        },
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["fullName"], "Game.Actor");
    assert_eq!(hits[0]["depth"], 0);
}

#[test]
fn inheritance_tree_of_player() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "getInheritanceTree",
        "params": {"moduleMvid": game_mvid_text(), "typeToken": TOKEN_PLAYER},
    })));
    // The base chain stops at the last resolvable definition.
    assert_eq!(result["baseChain"], json!(["Game.Actor"]));
    assert_eq!(result["derivedTypes"].as_array().unwrap().len(), 0);

    let result = ok(dispatcher().handle_value(json!({
        "id": 2,
        "method": "getInheritanceTree",
        "params": {"moduleMvid": game_mvid_text(), "typeToken": TOKEN_ACTOR},
    })));
    let derived = result["derivedTypes"].as_array().unwrap();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0]["fullName"], "Game.Player");
    assert_eq!(derived[0]["depth"], 1);
}

#[test]
fn implementations_of_interface_type() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findImplementations",
        "params": {"moduleMvid": game_mvid_text(), "typeToken": TOKEN_IENTITY},
    })));
    let mut names: Vec<String> = result["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["fullName"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    // Player implements through its base type.
    assert_eq!(names, vec!["Game.Actor", "Game.Player"]);
}

#[test]
fn implementations_of_interface_method() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findImplementations",
        "params": {"moduleMvid": game_mvid_text(), "methodToken": TOKEN_IENTITY_UPDATE},
    })));
    let hits = result["results"].as_array().unwrap();
    let methods: Vec<&str> = hits
        .iter()
        .map(|h| h["methodFullName"].as_str().unwrap())
        .collect();
    assert!(methods.contains(&"Game.Actor::Update"));
    assert!(methods.contains(&"Game.Player::Update"));
    for hit in hits {
        assert_eq!(hit["implementationKind"], "interface");
    }
}

#[test]
fn overrides_of_base_method() {
    // Player::Update has no explicit override declaration; name+signature
    // equality along the base chain is enough.
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findImplementations",
        "params": {"moduleMvid": game_mvid_text(), "methodToken": TOKEN_ACTOR_UPDATE},
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["methodFullName"], "Game.Player::Update");
    assert_eq!(hits[0]["implementationKind"], "override");
}

#[test]
fn implementations_require_a_target() {
    let response = dispatcher()
        .handle_value(json!({
            "id": 1,
            "method": "findImplementations",
            "params": {"moduleMvid": game_mvid_text()},
        }))
        .unwrap();
    assert_eq!(response["error"]["code"], json!(-32602));
}

#[test]
fn overrides_chain_of_player_update() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "getOverridesChain",
        "params": {"moduleMvid": game_mvid_text(), "token": TOKEN_PLAYER_UPDATE},
    })));
    let chain = result["baseChain"].as_array().unwrap();
    // Root first: Actor::Update, then Player::Update.
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0]["methodFullName"], "Game.Actor::Update");
    assert_eq!(chain[1]["methodFullName"], "Game.Player::Update");
}

#[test]
fn overrides_chain_lists_downward_overrides() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "getOverridesChain",
        "params": {"moduleMvid": game_mvid_text(), "token": TOKEN_ACTOR_UPDATE},
    })));
    let overrides = result["overrides"].as_array().unwrap();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0]["methodFullName"], "Game.Player::Update");
    assert_eq!(overrides[0]["depth"], 1);
}

#[test]
fn path_from_world_to_inventory() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findPathToType",
        "params": {
            "fromModuleMvid": game_mvid_text(),
            "fromTypeToken": TOKEN_WORLD,
            "toTypeFullName": "Game.Inventory",
        },
    })));
    assert_eq!(result["found"], true);
    assert_eq!(result["depth"], 2);
    let path = result["path"].as_array().unwrap();
    assert_eq!(path[0]["from"], "Game.World");
    assert_eq!(path[0]["viaKind"], "field");
    assert_eq!(path[0]["viaName"], "player");
    assert_eq!(path[0]["to"], "Game.Player");
    assert_eq!(path[1]["to"], "Game.Inventory");
}

#[test]
fn path_respects_depth_bound() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findPathToType",
        "params": {
            "fromModuleMvid": game_mvid_text(),
            "fromTypeToken": TOKEN_WORLD,
            "toTypeFullName": "Game.Inventory",
            "maxDepth": 1,
        },
    })));
    assert_eq!(result["found"], false);
    assert_eq!(result["path"].as_array().unwrap().len(), 0);
}

#[test]
fn path_to_unknown_type_is_invalid_parameter() {
    let response = dispatcher()
        .handle_value(json!({
            "id": 1,
            "method": "findPathToType",
            "params": {
                "fromModuleMvid": game_mvid_text(),
                "fromTypeToken": TOKEN_WORLD,
                "toTypeFullName": "Game.Missing",
            },
        }))
        .unwrap();
    assert_eq!(response["error"]["code"], json!(-32602));
}

#[test]
fn callers_of_actor_update() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "getCallers",
        "params": {"moduleMvid": game_mvid_text(), "token": TOKEN_ACTOR_UPDATE},
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["methodFullName"], "Game.Player::Respawn");
}

#[test]
fn callees_of_respawn() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "getCallees",
        "params": {"moduleMvid": game_mvid_text(), "token": TOKEN_PLAYER_RESPAWN},
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["fullName"], "Game.Actor::Update");
    assert_eq!(hits[0]["token"], TOKEN_ACTOR_UPDATE);
}

#[test]
fn method_usages_carry_call_kind() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findMethodUsages",
        "params": {"moduleMvid": game_mvid_text(), "token": TOKEN_ACTOR_UPDATE},
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["callKind"], "callvirt");
    assert_eq!(hits[0]["ilOffset"], 5);
}

#[test]
fn field_usages_classify_and_filter() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findFieldUsages",
        "params": {"moduleMvid": game_mvid_text(), "token": TOKEN_ACTOR_NAME},
    })));
    assert_eq!(result["results"].as_array().unwrap().len(), 2);

    let result = ok(dispatcher().handle_value(json!({
        "id": 2,
        "method": "findFieldUsages",
        "params": {
            "moduleMvid": game_mvid_text(),
            "token": TOKEN_ACTOR_NAME,
            "accessKind": "read",
        },
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["accessKind"], "read");

    let response = dispatcher()
        .handle_value(json!({
            "id": 3,
            "method": "findFieldUsages",
            "params": {
                "moduleMvid": game_mvid_text(),
                "token": TOKEN_ACTOR_NAME,
                "accessKind": "sideways",
            },
        }))
        .unwrap();
    assert_eq!(response["error"]["code"], json!(-32602));
}

#[test]
fn type_usages_of_player() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findTypeUsages",
        "params": {"moduleMvid": game_mvid_text(), "typeToken": TOKEN_PLAYER},
    })));
    let hits = result["results"].as_array().unwrap();
    let kinds: Vec<&str> = hits
        .iter()
        .map(|h| h["usageKind"].as_str().unwrap())
        .collect();
    // World.player is a field of type Player.
    assert!(kinds.contains(&"field"));
}

#[test]
fn type_dependencies_of_actor() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "getTypeDependencies",
        "params": {"moduleMvid": game_mvid_text(), "typeToken": TOKEN_ACTOR},
    })));
    let deps: Vec<&str> = result
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap())
        .collect();
    assert!(deps.contains(&"System.Object"));
    assert!(deps.contains(&"Game.IEntity"));
    assert!(deps.contains(&"System.String"));
    assert!(deps.contains(&"System.Single"));
    // Sorted output.
    let mut sorted = deps.clone();
    sorted.sort_unstable();
    assert_eq!(deps, sorted);
}

#[test]
fn find_references_by_kind() {
    // Type references go through the dependency scan.
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "findReferences",
        "params": {
            "moduleMvid": game_mvid_text(),
            "kind": "type",
            "token": TOKEN_INVENTORY,
        },
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["typeFullName"], "Game.Player");

    // Property references expand to accessor call sites.
    let result = ok(dispatcher().handle_value(json!({
        "id": 2,
        "method": "findReferences",
        "params": {
            "moduleMvid": game_mvid_text(),
            "kind": "method",
            "token": TOKEN_ACTOR_UPDATE,
        },
    })));
    let hits = result["results"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["ilOffset"], 5);

    let response = dispatcher()
        .handle_value(json!({
            "id": 3,
            "method": "findReferences",
            "params": {
                "moduleMvid": game_mvid_text(),
                "kind": "blob",
                "token": TOKEN_ACTOR_UPDATE,
            },
        }))
        .unwrap();
    assert_eq!(response["error"]["code"], json!(-32602));
}

#[test]
fn assembly_graph_nodes_and_edges() {
    let result = ok(dispatcher().handle_value(json!({
        "id": 1,
        "method": "getAssemblyGraph",
        "params": {},
    })));
    let nodes = result["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["assemblyName"], "Game");
    let edges = result["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["toAssembly"], "mscorlib");
}
