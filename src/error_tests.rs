//! Unit tests for error.rs

use crate::error::Error;

// ============================================================================
// DISPLAY TESTS
// ============================================================================

#[test]
fn test_structural_violation_display() {
    let err = Error::StructuralViolation("child node does not exist".to_string());
    assert_eq!(
        format!("{}", err),
        "Structural violation: child node does not exist"
    );
}

#[test]
fn test_not_found_display() {
    assert_eq!(
        format!("{}", Error::NotFound),
        "Object is not tracked by the octree"
    );
}

#[test]
fn test_already_tracked_display() {
    assert_eq!(
        format!("{}", Error::AlreadyTracked),
        "Object is already tracked by the octree"
    );
}

#[test]
fn test_uninitialized_tree_display() {
    assert_eq!(
        format!("{}", Error::UninitializedTree),
        "Octree has not been initialized"
    );
}

#[test]
fn test_invalid_configuration_display() {
    let err = Error::InvalidConfiguration("width must be positive".to_string());
    assert_eq!(
        format!("{}", err),
        "Invalid configuration: width must be positive"
    );
}

// ============================================================================
// TRAIT TESTS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(Error::NotFound);
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_error_equality() {
    assert_eq!(Error::NotFound, Error::NotFound);
    assert_ne!(Error::NotFound, Error::UninitializedTree);
    assert_eq!(
        Error::InvalidConfiguration("x".to_string()),
        Error::InvalidConfiguration("x".to_string())
    );
}

#[test]
fn test_error_clone() {
    let err = Error::StructuralViolation("broken".to_string());
    assert_eq!(err.clone(), err);
}
