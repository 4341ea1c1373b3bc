//! Integration tests for validation runs.

use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedNode, Term, TermRef, Triple};
use oxrdfio::{RdfFormat, RdfParser};
use oxshacl::vocab::sh;
use oxshacl::{
    InferenceError, InferenceMode, InputKind, ReportError, ResultFragment, ValidateArgs,
    ValidateError, ValidateOutput, ValidationOptions, ValidationOrchestrator, ValidationReport,
    check_expected_result, classify, validate,
};
use std::path::PathBuf;

const PREFIXES: &str = "
    @prefix sh: <http://www.w3.org/ns/shacl#> .
    @prefix dash: <http://datashapes.org/dash#> .
    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
    @prefix owl: <http://www.w3.org/2002/07/owl#> .
    @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
    @prefix ex: <http://example.org/> .
";

/// Helper to parse a Turtle string into a Graph.
fn parse_turtle(turtle: &str) -> Graph {
    let mut graph = Graph::new();
    let data = format!("{PREFIXES}{turtle}");
    for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(data.as_bytes()) {
        graph.insert(quad.expect("Failed to parse turtle").as_ref());
    }
    graph
}

fn run(data: &str, shapes: &str, inference: InferenceMode) -> ValidationReport {
    ValidationOrchestrator::new(ValidationOptions::default().with_inference(inference))
        .run(&mut parse_turtle(data), &parse_turtle(shapes))
        .expect("Validation failed")
}

fn results(report: &ValidationReport) -> Vec<Term> {
    report
        .graph()
        .triples_for_predicate(sh::RESULT)
        .map(|t| t.object.into_owned())
        .collect()
}

const NAME_SHAPE: &str = "
    ex:PersonShape a sh:NodeShape ;
        sh:targetClass ex:Person ;
        sh:property [ sh:path ex:name ; sh:minCount 1 ] .
";

// =============================================================================
// Orchestration
// =============================================================================

#[test]
fn test_min_count_violation() {
    let report = run("ex:alice a ex:Person .", NAME_SHAPE, InferenceMode::None);

    assert!(!report.conforms());
    assert_eq!(report.result_count(), 1);
    assert_eq!(results(&report).len(), 1);
    assert!(report.text().contains("Results (1)"));
    assert!(report.text().contains("MinCountConstraintComponent"));
    assert!(report.text().contains("Focus Node: <http://example.org/alice>"));
}

#[test]
fn test_conforming_data() {
    let report = run(
        "ex:alice a ex:Person ; ex:name \"Alice\" .",
        NAME_SHAPE,
        InferenceMode::None,
    );

    assert!(report.conforms());
    assert!(results(&report).is_empty());
    assert!(!report.text().contains("Results ("));
}

#[test]
fn test_empty_graphs() {
    let report = ValidationOrchestrator::default()
        .run(&mut Graph::new(), &Graph::new())
        .unwrap();

    assert!(report.conforms());
    assert_eq!(report.result_count(), 0);
    assert_eq!(report.text(), "Validation Report\nConforms: True\n");
}

#[test]
fn test_shapes_graph_without_shapes_conforms() {
    let report = run(
        "ex:alice a ex:Person .",
        "ex:something ex:unrelated ex:triple .",
        InferenceMode::None,
    );
    assert!(report.conforms());
}

#[test]
fn test_results_of_all_shapes_are_concatenated() {
    let shapes = "
        ex:AShape sh:targetNode ex:alice, ex:bob ;
            sh:property [ sh:path ex:name ; sh:minCount 1 ] .
        ex:BShape sh:targetNode ex:alice ;
            sh:property [ sh:path ex:age ; sh:datatype xsd:integer ] .
        ex:CShape sh:targetNode ex:bob ;
            sh:property [ sh:path ex:name ; sh:maxCount 5 ] .
    ";
    let data = "
        ex:alice ex:age \"old\" .
        ex:bob ex:age 42 .
    ";
    let report = run(data, shapes, InferenceMode::None);

    assert!(!report.conforms());
    // two minCount violations from AShape, one datatype violation from BShape
    assert_eq!(report.result_count(), 3);
    let shapes: Vec<Term> = report
        .graph()
        .triples_for_predicate(sh::SOURCE_SHAPE)
        .map(|t| t.object.into_owned())
        .collect();
    assert_eq!(shapes.len(), 3);
    assert!(report.text().find("MinCount") < report.text().find("Datatype"));
}

#[test]
fn test_warnings_do_not_break_conformance() {
    let shapes = "
        ex:PersonShape sh:targetClass ex:Person ; sh:severity sh:Warning ;
            sh:property [ sh:path ex:name ; sh:minCount 1 ; sh:severity sh:Warning ] .
    ";
    let report = run("ex:alice a ex:Person .", shapes, InferenceMode::None);

    assert!(report.conforms());
    assert_eq!(report.result_count(), 1);
    assert!(report.text().contains("Severity: sh:Warning"));
}

#[test]
fn test_report_graph_structure() {
    let report = run("ex:alice a ex:Person .", NAME_SHAPE, InferenceMode::None);
    let graph = report.graph();

    let reports: Vec<_> = graph
        .subjects_for_predicate_object(rdf::TYPE, sh::VALIDATION_REPORT)
        .collect();
    assert_eq!(reports.len(), 1);
    let [result] = results(&report).try_into().unwrap();
    let Term::BlankNode(result) = result else {
        panic!("result nodes are blank nodes");
    };
    assert!(graph.contains(&Triple::new(
        result.clone(),
        rdf::TYPE,
        sh::VALIDATION_RESULT
    )));
    assert_eq!(
        graph.object_for_subject_predicate(result.as_ref(), sh::FOCUS_NODE),
        Some(TermRef::from(
            NamedNode::new("http://example.org/alice").unwrap().as_ref()
        ))
    );
    assert_eq!(
        graph.object_for_subject_predicate(result.as_ref(), sh::RESULT_PATH),
        Some(TermRef::from(
            NamedNode::new("http://example.org/name").unwrap().as_ref()
        ))
    );
}

#[test]
fn test_non_conformant_without_results_is_rejected() {
    assert!(matches!(
        ValidationReport::build(false, &[] as &[ResultFragment]),
        Err(ReportError::InvariantViolation)
    ));
}

// =============================================================================
// Inference
// =============================================================================

#[test]
fn test_rdfs_inference_adds_targets() {
    let data = "
        ex:hasName rdfs:domain ex:Person .
        ex:alice ex:hasName \"Alice\" .
    ";
    let shapes = "
        ex:PersonShape sh:targetClass ex:Person ;
            sh:property [ sh:path ex:age ; sh:minCount 1 ] .
    ";
    assert!(run(data, shapes, InferenceMode::None).conforms());
    let report = run(data, shapes, InferenceMode::Rdfs);
    assert!(!report.conforms());
    assert_eq!(report.result_count(), 1);
}

#[test]
fn test_owl_rl_inference_adds_values() {
    let data = "
        ex:knows a owl:SymmetricProperty .
        ex:alice a ex:Person ; ex:knows ex:bob .
        ex:bob a ex:Person .
    ";
    let shapes = "
        ex:PersonShape sh:targetClass ex:Person ;
            sh:property [ sh:path ex:knows ; sh:minCount 1 ] .
    ";
    assert_eq!(run(data, shapes, InferenceMode::None).result_count(), 1);
    assert!(run(data, shapes, InferenceMode::OwlRl).conforms());
}

#[test]
fn test_unsupported_inference_modes() {
    for mode in ["RDFS", "owl", "OWLRL", "rdfs+owlrl", ""] {
        assert!(
            matches!(
                mode.parse::<InferenceMode>(),
                Err(InferenceError::UnsupportedMode { .. })
            ),
            "{mode} must be rejected"
        );
    }
}

#[test]
fn test_combined_mode_aliases_are_equivalent() {
    let data = "
        ex:hasName rdfs:domain ex:Person .
        ex:knows a owl:SymmetricProperty .
        ex:alice ex:hasName \"Alice\" ; ex:knows ex:bob .
        ex:bob ex:hasName \"Bob\" .
    ";
    let shapes = "
        ex:PersonShape sh:targetClass ex:Person ;
            sh:property [ sh:path ex:knows ; sh:minCount 1 ] ;
            sh:property [ sh:path ex:age ; sh:minCount 1 ] .
    ";
    let reports: Vec<ValidationReport> = ["both", "all", "rdfsowlrl"]
        .into_iter()
        .map(|mode| run(data, shapes, mode.parse().unwrap()))
        .collect();
    for report in &reports {
        assert_eq!(report.conforms(), reports[0].conforms());
        assert_eq!(report.result_count(), reports[0].result_count());
    }
    // alice and bob are both missing ex:age, bob knows alice by symmetry
    assert_eq!(reports[0].result_count(), 2);
}

#[test]
fn test_inference_mutates_the_data_graph() {
    let mut data = parse_turtle("ex:Employee rdfs:subClassOf ex:Person . ex:alice a ex:Employee .");
    let before = data.len();
    ValidationOrchestrator::new(ValidationOptions::default().with_inference(InferenceMode::Rdfs))
        .run(&mut data, &Graph::new())
        .unwrap();
    assert!(data.len() > before);
    assert!(data.contains(&Triple::new(
        NamedNode::new("http://example.org/alice").unwrap(),
        rdf::TYPE,
        NamedNode::new("http://example.org/Person").unwrap(),
    )));
}

// =============================================================================
// Inputs
// =============================================================================

#[test]
fn test_input_classification() {
    assert_eq!(
        classify("data.ttl"),
        InputKind::File {
            path: PathBuf::from("data.ttl"),
            format: Some(RdfFormat::Turtle)
        }
    );
    let InputKind::File {
        format: Some(json),
        ..
    } = classify("data.json")
    else {
        panic!("data.json must be a file");
    };
    assert_eq!(json.name(), "JSON-LD");
    assert_eq!(classify(&"a".repeat(500)), InputKind::Inline);
}

#[test]
fn test_validate_inline_inputs() {
    let output = validate(
        format!("{PREFIXES} ex:alice a ex:Person ."),
        ValidateArgs {
            shacl: Some(format!("{PREFIXES}{NAME_SHAPE}").into()),
            ..ValidateArgs::default()
        },
    )
    .unwrap();
    assert!(!output.is_success());
    let ValidateOutput::Report(report) = output else {
        panic!("expected a report");
    };
    assert_eq!(report.result_count(), 1);
}

#[test]
fn test_validate_with_loaded_graphs() {
    let output = validate(
        parse_turtle("ex:alice a ex:Person ; ex:name \"Alice\" ."),
        ValidateArgs {
            shacl: Some(parse_turtle(NAME_SHAPE).into()),
            ..ValidateArgs::default()
        },
    )
    .unwrap();
    assert!(output.is_success());
}

#[test]
fn test_validate_with_explicit_format() {
    let data = "<http://example.org/alice> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/Person> .";
    let output = validate(
        data,
        ValidateArgs {
            shacl: Some(format!("{PREFIXES}{NAME_SHAPE}").into()),
            data_format: Some(RdfFormat::NTriples),
            serialize_report: Some(RdfFormat::Turtle),
            ..ValidateArgs::default()
        },
    )
    .unwrap();
    let ValidateOutput::Serialized { conforms, bytes } = output else {
        panic!("expected a serialized report");
    };
    assert!(!conforms);
    let turtle = String::from_utf8(bytes).unwrap();
    assert!(turtle.contains("sh:ValidationResult"));
}

#[test]
fn test_validate_propagates_parse_errors() {
    assert!(matches!(
        validate(
            "this is not RDF",
            ValidateArgs {
                data_format: Some(RdfFormat::NTriples),
                ..ValidateArgs::default()
            }
        ),
        Err(ValidateError::Load(_))
    ));
}

#[test]
fn test_validate_ignores_inferred_shapes() {
    // Without a shapes graph, shapes come from the data graph as it was before inference:
    // ex:Shape only becomes an sh:NodeShape through rdfs:subClassOf
    let data = format!(
        "{PREFIXES}
        ex:MyShape rdfs:subClassOf sh:NodeShape .
        ex:Shape a ex:MyShape ; sh:property [ sh:path ex:name ; sh:minCount 1 ] .
        ex:Shape a rdfs:Class .
        ex:alice a ex:Shape ."
    );
    let output = validate(
        data,
        ValidateArgs {
            options: ValidationOptions::default().with_inference(InferenceMode::Rdfs),
            ..ValidateArgs::default()
        },
    )
    .unwrap();
    assert!(output.is_success());
}

// =============================================================================
// Expected results
// =============================================================================

fn fixture(results: usize) -> String {
    let results = (0..results)
        .map(|i| format!("sh:result [ a sh:ValidationResult ; sh:focusNode ex:whatever{i} ] ;"))
        .collect::<String>();
    format!(
        "ex:test a dash:GraphValidationTestCase ;
            dash:expectedResult [ a sh:ValidationReport ; {results} sh:conforms false ] ."
    )
}

const TWO_RESULTS_DATA: &str = "
    ex:ShapeA sh:targetNode ex:alice, ex:bob ;
        sh:property [ sh:path ex:name ; sh:minCount 1 ] .
";

#[test]
fn test_expected_result_matching() {
    let shapes = format!("{TWO_RESULTS_DATA}{}", fixture(2));
    let report = run("ex:alice a ex:Person .", &shapes, InferenceMode::None);
    assert_eq!(report.result_count(), 2);
    assert_eq!(
        check_expected_result(report.graph(), &parse_turtle(&shapes)),
        Ok(true)
    );
}

#[test]
fn test_expected_result_count_mismatch() {
    let shapes = format!("{TWO_RESULTS_DATA}{}", fixture(3));
    let report = run("ex:alice a ex:Person .", &shapes, InferenceMode::None);
    assert_eq!(
        check_expected_result(report.graph(), &parse_turtle(&shapes)),
        Ok(false)
    );
}

#[test]
fn test_validate_checks_expected_result() {
    let shapes = format!("{PREFIXES}{TWO_RESULTS_DATA}{}", fixture(2));
    let output = validate(
        format!("{PREFIXES} ex:alice a ex:Person ."),
        ValidateArgs {
            shacl: Some(shapes.into()),
            check_expected_result: true,
            ..ValidateArgs::default()
        },
    )
    .unwrap();
    assert!(matches!(output, ValidateOutput::ExpectedResult(true)));
}

#[test]
fn test_validate_reports_malformed_fixture() {
    assert!(matches!(
        validate(
            "<http://example.org/s> <http://example.org/p> <http://example.org/o> .",
            ValidateArgs {
                check_expected_result: true,
                ..ValidateArgs::default()
            }
        ),
        Err(ValidateError::Fixture(_))
    ));
}
