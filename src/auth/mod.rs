// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless session gateway for the admin surface.
//!
//! ## Auth Flow
//!
//! 1. The sign-in page obtains a JWT from the identity provider
//! 2. It posts the raw token to `/api/session`, which sets the session cookie
//!    after a shape check only
//! 3. Every request under the protected prefix:
//!    - Reads the cookie
//!    - Verifies signature (JWKS), issuer, audience and expiry
//!    - Extracts the role claim into a [`RoleSet`]
//!    - Redirects to sign-in, pending or unauthorized, or passes through
//!
//! ## Security
//!
//! - No server-side session state; the cookie is re-verified on each request
//! - Verification failures all look the same to the caller
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod gate;
pub mod jwks;
pub mod roles;
pub mod session;
pub mod verifier;

pub use claims::{SessionClaims, SessionIdentity};
pub use error::AuthError;
pub use gate::{role_gate, Gate, GateDecision, GatePolicy, GateRule};
pub use jwks::{JwksManager, KeyResolver, ResolvedKey, StaticKeyResolver};
pub use roles::RoleSet;
pub use session::{is_plausible_token, SessionCookie};
pub use verifier::TokenVerifier;
