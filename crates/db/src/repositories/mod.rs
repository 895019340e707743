//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Multi-row invariants
//! (completion + streak + ledger, queue resolution + crediting) run inside
//! single transactions within the owning repository.

pub mod community_repo;
pub mod completion_repo;
pub mod conversation_repo;
pub mod friendship_repo;
pub mod membership_repo;
pub mod message_repo;
pub mod notification_repo;
pub mod refresh_token_repo;
pub mod squad_repo;
pub mod task_repo;
pub mod user_repo;
pub mod verification_repo;
pub mod verifier_config_repo;
pub mod xp_repo;

pub use community_repo::CommunityRepo;
pub use completion_repo::CompletionRepo;
pub use conversation_repo::ConversationRepo;
pub use friendship_repo::FriendshipRepo;
pub use membership_repo::MembershipRepo;
pub use message_repo::MessageRepo;
pub use notification_repo::NotificationRepo;
pub use refresh_token_repo::RefreshTokenRepo;
pub use squad_repo::SquadRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
pub use verification_repo::VerificationRepo;
pub use verifier_config_repo::VerifierConfigRepo;
pub use xp_repo::XpTransactionRepo;
