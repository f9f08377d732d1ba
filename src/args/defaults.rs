pub(crate) const DEFAULT_USER_AGENT: &str = concat!("ratefire/", env!("CARGO_PKG_VERSION"));
