use std::fmt::{Display, Formatter};

/// What an array knows about itself: eager arrays hold their data, type tracers only a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Backend {
    /// Whether the values are present.
    pub known_data: bool,
    /// Whether the length is present.
    pub known_shape: bool,
}

impl Backend {
    pub const EAGER: Backend = Backend {
        known_data: true,
        known_shape: true,
    };

    pub const fn typetracer(known_shape: bool) -> Self {
        Self {
            known_data: false,
            known_shape,
        }
    }

    pub fn is_eager(&self) -> bool {
        self.known_data
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.known_data, self.known_shape) {
            (true, _) => write!(f, "eager"),
            (false, true) => write!(f, "typetracer (known length)"),
            (false, false) => write!(f, "typetracer"),
        }
    }
}
