//! Comparison of a validation report with the expected result of a test case.
//!
//! Fixtures follow the layout of the W3C SHACL test suite:
//!
//! ```turtle
//! <> a dash:GraphValidationTestCase ;
//!     dash:expectedResult [
//!         a sh:ValidationReport ;
//!         sh:conforms false ;
//!         sh:result [ ... ], [ ... ]
//!     ] .
//! ```

use crate::error::FixtureError;
use crate::model::as_node_ref;
use crate::vocab::{dash, sh};
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Graph, NamedOrBlankNodeRef, TermRef};
use tracing::{error, info};

/// Checks that `report` has the conformance and the number of results declared by the test
/// case of `fixture`.
///
/// Result nodes are only counted, never compared.
/// A mismatch returns `Ok(false)`, a malformed fixture or report is an error.
pub fn check_expected_result(report: &Graph, fixture: &Graph) -> Result<bool, FixtureError> {
    let nodes = find_nodes(report, fixture).inspect_err(|e| error!("{e}"))?;

    let expected_conforms = as_bool(nodes.expected_conforms);
    let actual_conforms = as_bool(nodes.report_conforms);
    let same_conformance = match (expected_conforms, actual_conforms) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => nodes.expected_conforms == nodes.report_conforms,
    };
    if !same_conformance {
        error!(
            "Expected sh:conforms {}, got {}.",
            nodes.expected_conforms, nodes.report_conforms
        );
        return Ok(false);
    }

    let expected_results = fixture
        .objects_for_subject_predicate(nodes.expected, sh::RESULT)
        .count();
    let actual_results = report
        .objects_for_subject_predicate(nodes.report, sh::RESULT)
        .count();
    if expected_results != actual_results {
        error!("Expected {expected_results} sh:result values, got {actual_results}.");
        return Ok(false);
    }
    info!(results = actual_results, "validation report matches the expected result");
    Ok(true)
}

struct FixtureNodes<'a> {
    expected: NamedOrBlankNodeRef<'a>,
    expected_conforms: TermRef<'a>,
    report: NamedOrBlankNodeRef<'a>,
    report_conforms: TermRef<'a>,
}

fn find_nodes<'a>(report: &'a Graph, fixture: &'a Graph) -> Result<FixtureNodes<'a>, FixtureError> {
    let test_case = fixture
        .subjects_for_predicate_object(rdf::TYPE, dash::GRAPH_VALIDATION_TEST_CASE)
        .next()
        .ok_or(FixtureError::NoTestCase)?;
    let expected = fixture
        .object_for_subject_predicate(test_case, dash::EXPECTED_RESULT)
        .and_then(as_node_ref)
        .ok_or(FixtureError::NoExpectedResult)?;
    let expected_conforms = fixture
        .object_for_subject_predicate(expected, sh::CONFORMS)
        .ok_or(FixtureError::NoExpectedConforms)?;
    let report_node = report
        .subjects_for_predicate_object(rdf::TYPE, sh::VALIDATION_REPORT)
        .next()
        .ok_or(FixtureError::NoReportNode)?;
    let report_conforms = report
        .object_for_subject_predicate(report_node, sh::CONFORMS)
        .ok_or(FixtureError::NoReportConforms)?;
    Ok(FixtureNodes {
        expected,
        expected_conforms,
        report: report_node,
        report_conforms,
    })
}

fn as_bool(term: TermRef<'_>) -> Option<bool> {
    let TermRef::Literal(literal) = term else {
        return None;
    };
    if literal.datatype() != xsd::BOOLEAN {
        return None;
    }
    match literal.value() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdfio::{RdfFormat, RdfParser};

    fn turtle(data: &str) -> Graph {
        let mut graph = Graph::new();
        let data = format!(
            "@prefix sh: <http://www.w3.org/ns/shacl#> .
             @prefix dash: <http://datashapes.org/dash#> .
             @prefix ex: <http://example.org/> .
             {data}"
        );
        for quad in RdfParser::from_format(RdfFormat::Turtle).for_slice(data.as_bytes()) {
            graph.insert(quad.unwrap().as_ref());
        }
        graph
    }

    fn fixture(conforms: bool, results: usize) -> Graph {
        let results = (0..results)
            .map(|i| format!("sh:result [ sh:focusNode ex:n{i} ] ;"))
            .collect::<String>();
        turtle(&format!(
            "ex:test a dash:GraphValidationTestCase ;
                dash:expectedResult [ a sh:ValidationReport ; {results} sh:conforms {conforms} ] ."
        ))
    }

    fn report(conforms: bool, results: usize) -> Graph {
        let results = (0..results)
            .map(|i| format!("sh:result [ sh:focusNode ex:other{i} ] ;"))
            .collect::<String>();
        turtle(&format!(
            "[] a sh:ValidationReport ; {results} sh:conforms {conforms} ."
        ))
    }

    #[test]
    fn test_matching_counts() {
        assert!(check_expected_result(&report(false, 2), &fixture(false, 2)).unwrap());
        assert!(check_expected_result(&report(true, 0), &fixture(true, 0)).unwrap());
    }

    #[test]
    fn test_mismatches_return_false() {
        assert!(!check_expected_result(&report(false, 3), &fixture(false, 2)).unwrap());
        assert!(!check_expected_result(&report(true, 0), &fixture(false, 0)).unwrap());
    }

    #[test]
    fn test_malformed_fixtures() {
        let report = report(true, 0);
        assert_eq!(
            check_expected_result(&report, &turtle("ex:test ex:p ex:o .")),
            Err(FixtureError::NoTestCase)
        );
        assert_eq!(
            check_expected_result(&report, &turtle("ex:test a dash:GraphValidationTestCase .")),
            Err(FixtureError::NoExpectedResult)
        );
        assert_eq!(
            check_expected_result(
                &report,
                &turtle("ex:test a dash:GraphValidationTestCase ; dash:expectedResult [ a sh:ValidationReport ] .")
            ),
            Err(FixtureError::NoExpectedConforms)
        );
    }

    #[test]
    fn test_malformed_reports() {
        let fixture = fixture(true, 0);
        assert_eq!(
            check_expected_result(&Graph::new(), &fixture),
            Err(FixtureError::NoReportNode)
        );
        assert_eq!(
            check_expected_result(&turtle("[] a sh:ValidationReport ."), &fixture),
            Err(FixtureError::NoReportConforms)
        );
    }

    #[test]
    fn test_fixture_errors_are_checked_in_order() {
        assert_eq!(
            check_expected_result(&Graph::new(), &Graph::new()),
            Err(FixtureError::NoTestCase)
        );
    }
}
