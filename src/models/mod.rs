pub mod doctor;
pub mod dto;
pub mod fact;
pub mod message;
pub mod news;
pub mod user;

pub use doctor::{Doctor, DoctorsBySpecialty};
pub use dto::{
    AuthResponse, ChatRequest, ChatResponse, CreateQuestionsRequest, GuestResponse, LoginRequest,
    SignupRequest, UpdateEmailRequest, UploadRequest,
};
pub use fact::{Choice, Fact, FactQuestion};
pub use message::ChatMessage;
pub use news::{NewsArticle, NewsList};
pub use user::{User, UserProfile};
