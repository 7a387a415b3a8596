//! Wire constants shared across the stack.
//!
//! Content types and JWT `typ` header values follow the OpenID Federation
//! draft so relying parties can dispatch on them.

/// Content type for a signed entity statement (entity configuration or
/// subordinate statement).
pub const CONTENT_TYPE_ENTITY_STATEMENT: &str = "application/entity-statement+jwt";

/// Content type for a signed trust mark.
pub const CONTENT_TYPE_TRUST_MARK: &str = "application/trust-mark+jwt";

/// Content type for a signed JWK set (historical keys document).
pub const CONTENT_TYPE_JWK_SET: &str = "application/jwk-set+jwt";

/// JWT `typ` header for entity statements.
pub const JWT_TYPE_ENTITY_STATEMENT: &str = "entity-statement+jwt";

/// JWT `typ` header for trust marks.
pub const JWT_TYPE_TRUST_MARK: &str = "trust-mark+jwt";

/// JWT `typ` header for signed JWK sets.
pub const JWT_TYPE_JWK_SET: &str = "jwk-set+jwt";

/// Well-known path where every federation entity publishes its entity
/// configuration.
pub const WELL_KNOWN_FEDERATION_PATH: &str = "/.well-known/openid-federation";
