// Domain-layer modules and shared errors/models
pub mod form {
    pub use crate::form::*;
}

pub mod gate {
    pub use crate::gate::*;
}

pub mod relay {
    pub use crate::relay::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
