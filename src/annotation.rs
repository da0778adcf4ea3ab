//! Per-column annotation rows.

/// One annotation value attached to a column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotation {
    pub display_character: String,
    pub description: String,
    pub secondary_structure: char,
    pub value: f32,
}

impl Annotation {
    pub fn new(display_character: impl Into<String>, value: f32) -> Self {
        Self {
            display_character: display_character.into(),
            description: String::new(),
            secondary_structure: ' ',
            value,
        }
    }
}

/// A labelled row of per-column values; `None` marks an empty column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignmentAnnotation {
    pub label: String,
    pub annotations: Vec<Option<Annotation>>,
}

impl AlignmentAnnotation {
    pub fn new(label: impl Into<String>, annotations: Vec<Option<Annotation>>) -> Self {
        Self {
            label: label.into(),
            annotations,
        }
    }

    /// Builds a row of plain numeric values.
    pub fn from_values(label: impl Into<String>, values: &[f32]) -> Self {
        let annotations = values
            .iter()
            .map(|&v| Some(Annotation::new(String::new(), v)))
            .collect();
        Self::new(label, annotations)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, col: usize) -> Option<&Annotation> {
        self.annotations.get(col).and_then(Option::as_ref)
    }

    /// Numeric values, `None` for empty columns.
    pub fn values(&self) -> Vec<Option<f32>> {
        self.annotations.iter().map(|a| a.as_ref().map(|a| a.value)).collect()
    }
}
