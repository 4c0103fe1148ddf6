use notegraph_core::model::ValidationError;
use notegraph_core::{Attribute, Branch, GraphError, GraphSnapshot, Note, NoteGraph};

fn setup() -> NoteGraph {
    let mut graph = NoteGraph::new();
    graph.upsert_note(Note::new("root", "root")).unwrap();
    graph
}

fn add_child(graph: &mut NoteGraph, parent: &str, id: &str, title: &str) {
    graph.upsert_note(Note::new(id, title)).unwrap();
    graph.upsert_branch(Branch::new(parent, id)).unwrap();
}

#[test]
fn clone_is_listed_under_every_parent_in_parent_order() {
    let mut graph = setup();
    add_child(&mut graph, "root", "p2", "Second");
    add_child(&mut graph, "root", "p1", "First");
    add_child(&mut graph, "root", "_hidden", "Hidden");
    add_child(&mut graph, "p2", "clone", "Shared");
    graph.upsert_branch(Branch::new("_hidden", "clone")).unwrap();
    graph.upsert_branch(Branch::new("p1", "clone")).unwrap();

    let parents = graph
        .parents("clone")
        .into_iter()
        .map(|note| note.note_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(parents, vec!["p1", "p2", "_hidden"]);
    assert_eq!(graph.children("p1")[0].note_id, "clone");
    assert!(graph.is_ancestor("root", "clone"));
    assert!(!graph.is_ancestor("p1", "p2"));
}

#[test]
fn children_follow_position_then_id() {
    let mut graph = setup();
    for (id, position) in [("c", 10), ("a", 20), ("b", 10)] {
        graph.upsert_note(Note::new(id, id)).unwrap();
        graph
            .upsert_branch(Branch::new("root", id).with_position(position))
            .unwrap();
    }

    let children = graph
        .children("root")
        .into_iter()
        .map(|note| note.note_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(children, vec!["b", "c", "a"]);
}

#[test]
fn branch_patches_reject_duplicates_cycles_and_missing_endpoints() {
    let mut graph = setup();
    add_child(&mut graph, "root", "a", "A");
    add_child(&mut graph, "a", "b", "B");

    let duplicate = Branch {
        branch_id: "another".to_string(),
        ..Branch::new("a", "b")
    };
    assert!(matches!(
        graph.upsert_branch(duplicate),
        Err(GraphError::DuplicateBranch { .. })
    ));

    assert!(graph.would_create_cycle("a", "b"));
    assert_eq!(
        graph.upsert_branch(Branch::new("b", "a")),
        Err(GraphError::CycleDetected {
            note_id: "a".to_string(),
            parent_note_id: "b".to_string(),
        })
    );

    assert_eq!(
        graph.upsert_branch(Branch::new("root", "ghost")),
        Err(GraphError::NoteNotFound("ghost".to_string()))
    );
    assert_eq!(
        graph.upsert_branch(Branch::new("a", "a")),
        Err(GraphError::Validation(ValidationError::SelfParentBranch {
            note_id: "a".to_string(),
        }))
    );
}

#[test]
fn deleted_note_keeps_guarding_against_cycles_until_restored() {
    let mut graph = setup();
    add_child(&mut graph, "root", "p", "P");
    add_child(&mut graph, "p", "x", "X");
    add_child(&mut graph, "x", "y", "Y");

    graph.delete_note("x").unwrap();
    assert!(graph.would_create_cycle("p", "y"));
    assert_eq!(
        graph.upsert_branch(Branch::new("y", "p")),
        Err(GraphError::CycleDetected {
            note_id: "p".to_string(),
            parent_note_id: "y".to_string(),
        })
    );

    graph.upsert_note(Note::new("x", "X")).unwrap();
    assert!(!graph.is_ancestor("p", "p"));
    assert_eq!(graph.parents("p")[0].note_id, "root");
    assert_eq!(
        graph.best_note_path("y"),
        Some(vec![
            "root".to_string(),
            "p".to_string(),
            "x".to_string(),
            "y".to_string(),
        ])
    );
}

#[test]
fn replacing_a_branch_moves_the_note() {
    let mut graph = setup();
    add_child(&mut graph, "root", "a", "A");
    add_child(&mut graph, "root", "b", "B");
    add_child(&mut graph, "a", "n", "N");

    let moved = Branch {
        parent_note_id: "b".to_string(),
        ..graph.get_branch("a_n").unwrap().clone()
    };
    graph.upsert_branch(moved).unwrap();

    assert!(graph.children("a").is_empty());
    assert_eq!(graph.parents("n")[0].note_id, "b");
}

#[test]
fn flat_text_tracks_prefixes_and_attributes() {
    let mut graph = setup();
    graph
        .upsert_note(Note::new("n1", "Alpha Rollout").with_content("Kickoff Notes"))
        .unwrap();
    graph
        .upsert_branch(Branch::new("root", "n1").with_prefix("Q3"))
        .unwrap();
    let status = Attribute::label("n1", "status", "Active").with_id("status1");
    graph.upsert_attribute(status).unwrap();

    assert_eq!(
        graph.flat_text("n1"),
        Some("n1 text text/html q3 alpha rollout #status=active kickoff notes")
    );
    assert_eq!(
        graph.note_title("n1", Some("root")).as_deref(),
        Some("Q3 - Alpha Rollout")
    );

    graph.delete_attribute("status1").unwrap();
    assert_eq!(
        graph.flat_text("n1"),
        Some("n1 text text/html q3 alpha rollout kickoff notes")
    );
}

#[test]
fn attribute_ids_cannot_be_renamed() {
    let mut graph = setup();
    graph
        .upsert_attribute(Attribute::label("root", "status", "x").with_id("attr1"))
        .unwrap();

    let renamed = Attribute::label("root", "phase", "x").with_id("attr1");
    assert!(matches!(
        graph.upsert_attribute(renamed),
        Err(GraphError::AttributeRenamed { .. })
    ));
    assert_eq!(
        graph.upsert_attribute(Attribute::label("ghost", "status", "x")),
        Err(GraphError::NoteNotFound("ghost".to_string()))
    );
}

#[test]
fn deleted_note_disappears_from_reads_and_orphans_its_children() {
    let mut graph = setup();
    add_child(&mut graph, "root", "folder", "Folder");
    add_child(&mut graph, "folder", "leaf", "Leaf");

    graph.delete_note("folder").unwrap();

    assert!(graph.get_note("folder").is_none());
    assert!(graph.flat_text("folder").is_none());
    assert!(graph.parents("leaf").is_empty());
    assert_eq!(graph.orphan_note_ids(), vec!["leaf".to_string()]);
    assert_eq!(
        graph.delete_note("folder"),
        Err(GraphError::NoteNotFound("folder".to_string()))
    );
}

#[test]
fn snapshot_json_builds_an_equivalent_graph() {
    let json = r#"{
        "notes": [
            {"note_id": "root", "title": "root"},
            {"note_id": "projects", "title": "Projects"},
            {"note_id": "code1", "title": "Script", "type": "code", "mime": "text/plain"}
        ],
        "branches": [
            {"note_id": "projects", "parent_note_id": "root"},
            {"note_id": "code1", "parent_note_id": "projects", "note_position": 10}
        ],
        "attributes": [
            {"attribute_id": "a1", "note_id": "projects", "type": "label",
             "name": "archived", "is_inheritable": true}
        ]
    }"#;
    let snapshot: GraphSnapshot = serde_json::from_str(json).unwrap();
    let graph = snapshot.into_graph().unwrap();

    assert!(graph.has_root());
    assert_eq!(graph.note_count(), 3);
    assert!(graph.get_branch("projects_code1").is_some());
    assert!(graph.attributes().is_archived("code1"));

    let exported = graph.to_snapshot();
    assert_eq!(exported.branches.len(), 2);
    let rebuilt = NoteGraph::from_snapshot(exported.clone()).unwrap();
    assert_eq!(rebuilt.to_snapshot(), exported);
}
