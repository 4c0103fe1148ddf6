use notegraph_core::search::flat_text::FlatTextSearch;
use notegraph_core::{
    Attribute, Branch, Expression, Note, NoteGraph, NoteSet, NoteType, SearchContext,
    SearchError, SearchOptions,
};

fn setup() -> NoteGraph {
    let mut graph = NoteGraph::new();
    graph.upsert_note(Note::new("root", "root")).unwrap();
    graph
}

fn add_note(graph: &mut NoteGraph, parent: &str, id: &str, title: &str) {
    graph.upsert_note(Note::new(id, title)).unwrap();
    graph.upsert_branch(Branch::new(parent, id)).unwrap();
}

fn clone_into(graph: &mut NoteGraph, parent: &str, id: &str) {
    graph.upsert_branch(Branch::new(parent, id)).unwrap();
}

fn path(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn run(graph: &NoteGraph, tokens: &[&str]) -> (NoteSet, SearchContext) {
    let mut context = SearchContext::default();
    let result = Expression::flat_text(tokens.iter().copied())
        .evaluate(graph, &NoteSet::all(graph), &mut context)
        .unwrap();
    (result, context)
}

fn projects_graph() -> NoteGraph {
    let mut graph = setup();
    add_note(&mut graph, "root", "projects", "Projects");
    add_note(&mut graph, "projects", "rollout1", "Alpha Rollout");
    graph
        .upsert_attribute(Attribute::label("rollout1", "status", "active"))
        .unwrap();
    graph
}

#[test]
fn title_and_owned_attribute_explain_a_note() {
    let graph = projects_graph();

    let (result, context) = run(&graph, &["Alpha", "ACTIVE"]);

    assert_eq!(result.notes().cloned().collect::<Vec<_>>(), vec!["rollout1"]);
    assert_eq!(
        context.note_path("rollout1"),
        Some(&path(&["root", "projects", "rollout1"]))
    );
}

#[test]
fn ancestor_titles_consume_remaining_tokens() {
    let graph = projects_graph();

    let (result, context) = run(&graph, &["projects", "rollout"]);

    assert_eq!(result.notes().cloned().collect::<Vec<_>>(), vec!["rollout1"]);
    assert_eq!(
        result.path("rollout1"),
        Some(&path(&["root", "projects", "rollout1"]))
    );
    assert!(context.note_path("projects").is_none());
}

#[test]
fn ancestor_attributes_and_branch_prefixes_are_searchable() {
    let mut graph = setup();
    add_note(&mut graph, "root", "finance", "Department");
    graph
        .upsert_attribute(Attribute::label("finance", "area", "Finance"))
        .unwrap();
    graph.upsert_note(Note::new("budget", "Budget")).unwrap();
    graph
        .upsert_branch(Branch::new("finance", "budget").with_prefix("Q3"))
        .unwrap();

    let (by_attribute, _) = run(&graph, &["finance", "budget"]);
    assert_eq!(
        by_attribute.path("budget"),
        Some(&path(&["root", "finance", "budget"]))
    );

    let (by_prefix, _) = run(&graph, &["q3", "budget"]);
    assert_eq!(
        by_prefix.notes().cloned().collect::<Vec<_>>(),
        vec!["budget"]
    );
}

#[test]
fn note_type_is_a_searchable_tag() {
    let mut graph = setup();
    graph
        .upsert_note(Note::new("deploy", "Deploy Steps").with_type(NoteType::Code))
        .unwrap();
    graph.upsert_branch(Branch::new("root", "deploy")).unwrap();

    let (result, _) = run(&graph, &["code", "deploy"]);
    assert_eq!(result.path("deploy"), Some(&path(&["root", "deploy"])));
}

#[test]
fn clone_is_found_through_the_parent_that_explains_it() {
    let mut graph = setup();
    add_note(&mut graph, "root", "teams", "Teams");
    add_note(&mut graph, "teams", "p1", "Alpha Team");
    add_note(&mut graph, "root", "p2", "Beta Team");
    add_note(&mut graph, "p2", "report", "Weekly Report");
    clone_into(&mut graph, "p1", "report");

    assert_eq!(
        graph.best_note_path("report"),
        Some(path(&["root", "p2", "report"]))
    );

    let (via_alpha, _) = run(&graph, &["alpha", "report"]);
    assert_eq!(
        via_alpha.notes().cloned().collect::<Vec<_>>(),
        vec!["report"]
    );
    assert_eq!(
        via_alpha.path("report"),
        Some(&path(&["root", "teams", "p1", "report"]))
    );

    let (via_beta, _) = run(&graph, &["beta", "report"]);
    assert_eq!(
        via_beta.path("report"),
        Some(&path(&["root", "p2", "report"]))
    );
}

#[test]
fn first_successful_parent_wins_over_a_shorter_path() {
    let mut graph = setup();
    add_note(&mut graph, "root", "deep", "Archive Shelf");
    add_note(&mut graph, "deep", "p1", "Alpha One");
    add_note(&mut graph, "root", "p2", "Alpha Two");
    add_note(&mut graph, "p1", "memo", "Memo");
    clone_into(&mut graph, "p2", "memo");

    let (result, context) = run(&graph, &["alpha", "memo"]);

    assert_eq!(
        result.path("memo"),
        Some(&path(&["root", "deep", "p1", "memo"]))
    );
    assert_eq!(context.note_path("memo"), result.path("memo"));
}

#[test]
fn tokens_missing_up_to_root_yield_no_match() {
    let graph = projects_graph();

    let (result, _) = run(&graph, &["alpha", "nowhere"]);
    assert!(result.is_empty());

    // The root title is never consumed.
    let (result, _) = run(&graph, &["alpha", "root"]);
    assert!(result.is_empty());
}

#[test]
fn single_token_equal_to_note_id_matches_directly() {
    let mut graph = setup();
    add_note(&mut graph, "root", "box", "Storage");
    add_note(&mut graph, "box", "Xk3Fz9", "Anything");

    let (result, context) = run(&graph, &["xk3fz9"]);

    assert_eq!(result.notes().cloned().collect::<Vec<_>>(), vec!["Xk3Fz9"]);
    assert_eq!(
        context.note_path("Xk3Fz9"),
        Some(&path(&["root", "box", "Xk3Fz9"]))
    );
}

#[test]
fn empty_token_list_returns_the_input() {
    let mut graph = projects_graph();
    graph.upsert_note(Note::new("loose", "Loose")).unwrap();
    let input = NoteSet::from_ids(["rollout1", "loose"]);
    let mut context = SearchContext::default();

    let result = FlatTextSearch::new(&graph, &[])
        .execute(&input, &mut context)
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(
        result.path("rollout1"),
        Some(&path(&["root", "projects", "rollout1"]))
    );
    assert_eq!(result.path("loose"), None);
    assert!(context.note_path("loose").is_none());
}

#[test]
fn raw_tokens_are_normalized_before_matching() {
    let graph = projects_graph();
    let expression = Expression::NoteFlatText {
        tokens: vec!["Alpha".to_string(), " ACTIVE ".to_string()],
    };

    let result = expression
        .evaluate(&graph, &NoteSet::all(&graph), &mut SearchContext::default())
        .unwrap();

    assert_eq!(result.notes().cloned().collect::<Vec<_>>(), vec!["rollout1"]);
}

#[test]
fn candidate_without_parents_never_matches() {
    let mut graph = projects_graph();
    graph
        .upsert_note(Note::new("loose", "Alpha Loose Ends"))
        .unwrap();

    let (result, context) = run(&graph, &["alpha", "ends"]);
    assert!(!result.has("loose"));
    assert!(context.note_path("loose").is_none());

    let (result, _) = run(&graph, &["loose"]);
    assert!(result.is_empty());
}

#[test]
fn deleted_ancestor_ends_only_its_own_branch() {
    let mut graph = setup();
    add_note(&mut graph, "root", "gone", "Gamma Archive");
    add_note(&mut graph, "gone", "p1", "Alpha One");
    add_note(&mut graph, "root", "kept", "Gamma Shelf");
    add_note(&mut graph, "kept", "p2", "Alpha Two");
    add_note(&mut graph, "p1", "memo", "Memo");
    clone_into(&mut graph, "p2", "memo");

    let (before, _) = run(&graph, &["gamma", "memo"]);
    assert_eq!(
        before.path("memo"),
        Some(&path(&["root", "gone", "p1", "memo"]))
    );

    graph.delete_note("gone").unwrap();
    let (after, context) = run(&graph, &["gamma", "memo"]);

    assert_eq!(after.notes().cloned().collect::<Vec<_>>(), vec!["memo"]);
    assert_eq!(
        after.path("memo"),
        Some(&path(&["root", "kept", "p2", "memo"]))
    );
    assert_eq!(context.note_path("memo"), after.path("memo"));
}

#[test]
fn results_are_deterministic_and_sound() {
    let mut graph = setup();
    for (id, title) in [("a", "Alpha Area"), ("b", "Beta Area"), ("c", "Gamma")] {
        add_note(&mut graph, "root", id, title);
    }
    for (id, title) in [("n1", "Alpha notes"), ("n2", "Area plan"), ("n3", "Misc")] {
        add_note(&mut graph, "c", id, title);
        clone_into(&mut graph, "a", id);
        clone_into(&mut graph, "b", id);
    }
    let tokens = ["alpha", "area"];

    let (first, first_context) = run(&graph, &tokens);
    let (second, second_context) = run(&graph, &tokens);
    assert_eq!(first, second);
    assert_eq!(first_context.note_paths(), second_context.note_paths());
    assert!(first.has("n1"));
    assert!(first.has("n2"));
    assert!(!first.has("n3"));

    for note_id in first.notes() {
        let path = first.path(note_id).unwrap();
        let text = path
            .iter()
            .filter_map(|id| graph.flat_text(id))
            .collect::<Vec<_>>()
            .join(" ");
        for token in tokens {
            assert!(text.contains(token), "{token} not explained for {note_id}");
        }
    }
}

#[test]
fn unknown_input_note_is_rejected() {
    let graph = projects_graph();
    let input = NoteSet::from_ids(["rollout1", "ghost"]);

    let err = Expression::flat_text(["alpha"])
        .evaluate(&graph, &input, &mut SearchContext::default())
        .unwrap_err();

    assert_eq!(err, SearchError::UnknownNote("ghost".to_string()));
}

#[test]
fn branch_budget_aborts_the_search() {
    let graph = projects_graph();
    let mut context = SearchContext::new(SearchOptions {
        max_branch_visits: Some(1),
        ..SearchOptions::default()
    });

    let err = Expression::flat_text(["projects", "rollout"])
        .evaluate(&graph, &NoteSet::all(&graph), &mut context)
        .unwrap_err();

    assert_eq!(err, SearchError::BranchBudgetExceeded { limit: 1 });
}
