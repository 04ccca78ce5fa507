// src/normalize/diagnostics.rs
use serde::Serialize;

/// Counters describing what a normalization pass emitted, synthesized and
/// dropped. Nothing here is an error; it is reported so lossy inputs are
/// visible to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub documents: usize,
    pub parts: usize,
    pub sections: usize,
    pub dropped_documents: usize,
    pub dropped_parts: usize,
    pub dropped_sections: usize,
    pub derived_section_ids: usize,
    pub defaulted_part_names: usize,
    pub wrapped_values: usize,
    /// `parts`/`sections` fields holding a scalar, treated as empty.
    pub unrecognized_shapes: usize,
}

impl Diagnostics {
    /// Total elements discarded because they were not records.
    pub fn dropped(&self) -> usize {
        self.dropped_documents + self.dropped_parts + self.dropped_sections
    }

    pub fn merge(&mut self, other: &Diagnostics) {
        self.documents += other.documents;
        self.parts += other.parts;
        self.sections += other.sections;
        self.dropped_documents += other.dropped_documents;
        self.dropped_parts += other.dropped_parts;
        self.dropped_sections += other.dropped_sections;
        self.derived_section_ids += other.derived_section_ids;
        self.defaulted_part_names += other.defaulted_part_names;
        self.wrapped_values += other.wrapped_values;
        self.unrecognized_shapes += other.unrecognized_shapes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_every_counter() {
        let mut total = Diagnostics { documents: 1, dropped_sections: 2, ..Default::default() };
        let other = Diagnostics { documents: 2, dropped_parts: 1, sections: 5, ..Default::default() };
        total.merge(&other);

        assert_eq!(total.documents, 3);
        assert_eq!(total.sections, 5);
        assert_eq!(total.dropped(), 3);
    }
}
