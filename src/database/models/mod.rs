pub mod user;
pub mod family_member;
pub mod report;
pub mod vitals;
pub mod ai_insight;

pub use user::User;
pub use family_member::{BloodGroup, FamilyMember, Relation};
pub use report::{FileType, Report};
pub use vitals::Vitals;
pub use ai_insight::AiInsight;
