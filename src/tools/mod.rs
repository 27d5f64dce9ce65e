/// Tools Module
///
/// One module per tool family. Each exports a `register` function that adds
/// its tools to the registry during server initialization, plus the pure
/// calculation functions the handlers call.

pub mod abs;
pub mod arithmetic;
pub mod exponent;
pub mod factorial;
