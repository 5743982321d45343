use assert_float_eq::*;
use cvsp::parsers::{graph_from_file, graph_from_str, write_graph};
use cvsp::{solve, solve_batch, BatchJob, CvspError, Graph, Library, ShorePolicy, Solution, SolveParameters, Status};
use paste::paste;

use std::path::PathBuf;
use std::time::Duration;

fn instance(name: &str) -> Graph {
    let path = PathBuf::from(format!("tests/instances/{}.txt", name));
    graph_from_file(&path).unwrap()
}

fn assert_partition(graph: &Graph, solution: &Solution, k: usize, b: usize) {
    assert_eq!(k, solution.shores().len());
    let assigned = solution.separator_size() + solution.shores().iter().map(|s| s.len()).sum::<usize>();
    assert_eq!(graph.number_vertices(), assigned);
    for shore in solution.shores().iter() {
        assert!(shore.len() <= b);
    }
    for (u, v) in graph.edges_iter() {
        let (lu, lv) = (solution.label(u), solution.label(v));
        assert!(lu == 0 || lv == 0 || lu == lv, "edge {}-{} joins shores {} and {}", graph.name(u), graph.name(v), lu, lv);
    }
}

macro_rules! instance_tests {
    ($name:ident, $k:expr, $b:expr, $expected:expr, $($library:ident $index:literal),*) => {
        paste! {
            $(
                #[test]
                fn [<$name _ $library:lower _ $index>]() {
                    let graph = instance(stringify!($name));
                    let parameters = SolveParameters::new($k, $b);
                    let result = solve(&graph, Library::$library, $index, &parameters).unwrap();
                    assert_eq!(Status::Optimal, result.status());
                    assert_eq!(Some($expected), result.objective());
                    assert_float_absolute_eq!($expected as f64, result.bound().unwrap(), 0.000001);
                    assert_partition(&graph, result.solution().unwrap(), $k, $b);
                }
            )*
        }
    }
}

macro_rules! integration_tests {
    ($($name:ident: ($k:expr, $b:expr) => $expected:expr,)*) => {
        $(
            instance_tests!($name, $k, $b, $expected,
                Simplex 1, Simplex 2, Simplex 3, Simplex 4,
                Trail 1, Trail 2, Trail 3, Trail 4, Trail 5, Trail 6, Trail 7, Trail 8);
        )*
    }
}

integration_tests! {
    path5: (2, 2) => 1,
    k4: (2, 1) => 3,
    edge: (2, 1) => 1,
    split: (2, 2) => 0,
    two_triangles: (2, 3) => 1,
    cycle6: (2, 2) => 2,
    star: (3, 2) => 1,
    grid3: (2, 3) => 3,
    isolated: (2, 2) => 1,
}

#[test]
fn formulations_agree_on_random_graphs() {
    for seed in 0..4 {
        let graph = Graph::random(8, 0.3, seed);
        let parameters = SolveParameters::new(3, 2);
        let reference = solve(&graph, Library::Trail, 1, &parameters).unwrap().objective();
        assert!(reference.is_some());
        for index in 2..=8 {
            let result = solve(&graph, Library::Trail, index, &parameters).unwrap();
            assert_eq!(reference, result.objective(), "trail formulation {} on seed {}", index, seed);
        }
        for index in 1..=4 {
            let result = solve(&graph, Library::Simplex, index, &parameters).unwrap();
            assert_eq!(reference, result.objective(), "simplex formulation {} on seed {}", index, seed);
        }
    }
}

#[test]
fn solving_twice_gives_the_same_objective() {
    let graph = instance("grid3");
    let parameters = SolveParameters::new(2, 3);
    for (library, index) in [(Library::Simplex, 1), (Library::Trail, 2), (Library::Trail, 6)] {
        let first = solve(&graph, library, index, &parameters).unwrap();
        let second = solve(&graph, library, index, &parameters).unwrap();
        assert_eq!(first.objective(), second.objective());
    }
}

#[test]
fn non_empty_shores_on_complete_graph() {
    let graph = instance("k4");
    let parameters = SolveParameters::new(2, 4).with_shore_policy(ShorePolicy::NonEmpty);
    for index in 1..=4 {
        let result = solve(&graph, Library::Simplex, index, &parameters).unwrap();
        assert_eq!(Status::Infeasible, result.status());
        assert!(result.solution().is_none());
        assert_eq!(None, result.objective());
    }
    for index in 1..=8 {
        let result = solve(&graph, Library::Trail, index, &parameters).unwrap();
        assert_eq!(Status::Infeasible, result.status());
    }
}

#[test]
fn already_split_graph_under_both_policies() {
    let graph = instance("split");
    for policy in [ShorePolicy::AllowEmpty, ShorePolicy::NonEmpty] {
        let parameters = SolveParameters::new(2, 2).with_shore_policy(policy);
        for index in 1..=8 {
            let result = solve(&graph, Library::Trail, index, &parameters).unwrap();
            assert_eq!(Some(0), result.objective());
            let solution = result.solution().unwrap();
            if policy == ShorePolicy::NonEmpty {
                assert!(solution.shores().iter().all(|s| !s.is_empty()));
            }
        }
    }
}

#[test]
fn non_empty_shores_need_a_larger_separator() {
    // With three shores on a path of five vertices, the separator must cut the path twice
    let graph = instance("path5");
    let allow = SolveParameters::new(3, 3);
    let non_empty = SolveParameters::new(3, 3).with_shore_policy(ShorePolicy::NonEmpty);
    for index in 1..=8 {
        assert_eq!(Some(1), solve(&graph, Library::Trail, index, &allow).unwrap().objective());
        assert_eq!(Some(2), solve(&graph, Library::Trail, index, &non_empty).unwrap().objective());
    }
}

#[test]
fn number_of_shores_larger_than_the_graph() {
    let graph = instance("path5");
    let allow = SolveParameters::new(usize::MAX, 2);
    for index in 1..=4 {
        assert_eq!(Some(1), solve(&graph, Library::Simplex, index, &allow).unwrap().objective());
    }
    for index in 1..=8 {
        assert_eq!(Some(1), solve(&graph, Library::Trail, index, &allow).unwrap().objective());
    }
    let non_empty = SolveParameters::new(usize::MAX, 2).with_shore_policy(ShorePolicy::NonEmpty);
    for index in 1..=8 {
        assert_eq!(Status::Infeasible, solve(&graph, Library::Trail, index, &non_empty).unwrap().status());
    }
}

#[test]
fn unsupported_formulations() {
    let graph = instance("path5");
    let parameters = SolveParameters::new(2, 2);
    for (library, index, max) in [(Library::Simplex, 0, 4), (Library::Simplex, 5, 4), (Library::Trail, 9, 8)] {
        match solve(&graph, library, index, &parameters) {
            Err(CvspError::UnsupportedFormulation { max: m, .. }) => assert_eq!(max, m),
            other => panic!("expected an unsupported formulation, got {:?}", other),
        }
    }
}

#[test]
fn invalid_parameters() {
    let graph = instance("path5");
    assert!(matches!(solve(&graph, Library::Trail, 1, &SolveParameters::new(1, 2)), Err(CvspError::InvalidParameter { name: "k", .. })));
    assert!(matches!(solve(&graph, Library::Trail, 1, &SolveParameters::new(2, 0)), Err(CvspError::InvalidParameter { name: "b", .. })));
}

#[test]
fn subset_cover_enumeration_limit() {
    let graph = Graph::random(18, 0.2, 3);
    let result = solve(&graph, Library::Trail, 3, &SolveParameters::new(2, 6));
    assert!(matches!(result, Err(CvspError::EnumerationLimit { vertices: 18, .. })));
}

#[test]
fn time_limit_without_solution() {
    let graph = instance("grid3");
    let parameters = SolveParameters::new(2, 3).with_time_limit(Duration::ZERO);
    for index in 1..=8 {
        let result = solve(&graph, Library::Trail, index, &parameters).unwrap();
        assert_eq!(Status::TimeLimit, result.status());
        assert!(result.solution().is_none());
    }
}

#[test]
fn iteration_budget_reports_a_bound() {
    let graph = instance("k4");
    let parameters = SolveParameters::new(2, 1).with_max_iterations(2);
    let result = solve(&graph, Library::Trail, 6, &parameters).unwrap();
    assert_eq!(Status::TimeLimit, result.status());
    let bound = result.bound().unwrap();
    assert!(bound <= 3.0);
}

#[test]
fn batch_keeps_the_order_of_the_jobs() {
    let jobs = [("path5", 2, 2, 1), ("k4", 2, 1, 3), ("cycle6", 2, 2, 2), ("star", 3, 2, 1)]
        .iter()
        .map(|(name, k, b, _)| BatchJob {
            graph: instance(name),
            library: Library::Trail,
            formulation_index: 2,
            parameters: SolveParameters::new(*k, *b),
        })
        .collect::<Vec<BatchJob>>();
    let results = solve_batch(&jobs);
    assert_eq!(4, results.len());
    for (result, expected) in results.iter().zip([1, 3, 2, 1]) {
        assert_eq!(Some(expected), result.as_ref().unwrap().objective());
    }
}

#[test]
fn solution_text_uses_file_names() {
    let graph = instance("star");
    let result = solve(&graph, Library::Trail, 1, &SolveParameters::new(3, 2)).unwrap();
    let text = result.to_text(&graph);
    assert!(text.starts_with("status: optimal\nseparator size: 1\n"));
    assert!(text.contains("S: hub\n"));
}

#[test]
fn generated_graph_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("random.txt");
    let graph = Graph::random(10, 0.25, 11);
    write_graph(&graph, &path).unwrap();
    let read = graph_from_file(&path).unwrap();
    assert_eq!(graph.number_vertices(), read.number_vertices());
    assert_eq!(graph.number_edges(), read.number_edges());
    let parameters = SolveParameters::new(3, 3);
    assert_eq!(
        solve(&graph, Library::Trail, 1, &parameters).unwrap().objective(),
        solve(&read, Library::Trail, 1, &parameters).unwrap().objective(),
    );
}

#[test]
fn malformed_files() {
    assert!(matches!(graph_from_str("3, 2, 0\n0, 1\n"), Err(CvspError::Parse { .. })));
    assert!(matches!(graph_from_str("2, 1, 1\n0, 1\n"), Err(CvspError::Parse { .. })));
    assert!(matches!(graph_from_file(&PathBuf::from("tests/instances/missing.txt")), Err(CvspError::Io(_))));
}
