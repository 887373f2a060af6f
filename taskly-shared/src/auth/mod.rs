/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`token`]: Opaque bearer token generation and hashing
/// - [`middleware`]: Bearer token extraction and the request `Session`
/// - [`authorization`]: The admin predicate and task ownership scopes
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id, 64 MB memory and 3 iterations by default
/// - **Bearer Tokens**: Random generation with SHA-256 hashing at rest
/// - **Constant-time Comparison**: All verification uses constant-time operations
///
/// # Example
///
/// ```
/// use taskly_shared::auth::password::{hash_password, verify_password, HashCost};
/// use taskly_shared::auth::token::generate_token;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password", &HashCost::minimal())?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let (token, token_hash) = generate_token();
/// assert_ne!(token, token_hash);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
