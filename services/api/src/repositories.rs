//! Repositories for document store operations

pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;

pub use bootcamp::BootcampRepository;
pub use course::CourseRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;

/// Users collection name
pub const USERS: &str = "users";

/// Bootcamps collection name
pub const BOOTCAMPS: &str = "bootcamps";

/// Courses collection name
pub const COURSES: &str = "courses";

/// Reviews collection name
pub const REVIEWS: &str = "reviews";
