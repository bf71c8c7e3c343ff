/// Weights used when both sides carry an embedding vector.
/// Vectors are the primary signal when present.
pub const VECTOR_WEIGHTS: Weights = Weights {
    vector: 0.5,
    skills: 0.3,
    experience: 0.2,
};

/// Fallback weights when no usable vector similarity exists.
/// Skill overlap takes over as the primary signal.
pub const FALLBACK_WEIGHTS: Weights = Weights {
    vector: 0.0,
    skills: 0.7,
    experience: 0.3,
};

#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub vector: f64,
    pub skills: f64,
    pub experience: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.vector + self.skills + self.experience
    }
}
