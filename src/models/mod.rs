pub mod lab;
pub mod schedule;
pub mod user;

pub use lab::{Lab, NewLabRequest, SystemConfiguration};
pub use schedule::{
    DaySchedule, LabSchedule, NewScheduleRequest, TimeSlot, Weekday, weekday_mask,
    windows_overlap,
};
pub use user::{
    ForgotPasswordRequest, LoginRequest, RegisterInchargeRequest, RegisterProgrammerRequest,
    ResetPasswordRequest, User, UserInfo,
};
