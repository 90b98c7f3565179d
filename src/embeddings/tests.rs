use super::*;

#[test]
fn matching_finite_vector_passes() {
    assert!(check_dimension(&[0.0, -1.5, 2.0], 3).is_ok());
}

#[test]
fn wrong_length_is_rejected() {
    let error = check_dimension(&[1.0, 2.0], 3).expect_err("length mismatch");
    assert!(matches!(error, RagError::EmbeddingFailure(ref m) if m.contains('3')));
}

#[test]
fn non_finite_components_are_rejected() {
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        let error = check_dimension(&[0.5, bad, 0.0], 3).expect_err("non-finite rejected");
        assert!(matches!(error, RagError::EmbeddingFailure(ref m) if m.contains("component 1")));
    }
}
