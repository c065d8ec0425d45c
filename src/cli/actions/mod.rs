pub mod run;

#[derive(Debug)]
pub enum Action {
    Register {
        name: String,
        email: String,
        password: String,
        phone: Option<String>,
        grade: Option<String>,
    },
    Login {
        email: String,
        password: String,
    },
    VerifyOtp {
        otp: String,
    },
    ResendOtp {
        email: Option<String>,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        token: Option<String>,
        password: String,
    },
    Logout,
    Whoami,
    Lessons(LessonsAction),
}

#[derive(Debug)]
pub enum LessonsAction {
    List {
        grade: Option<String>,
        unit: Option<String>,
        search: Option<String>,
        page: u32,
        limit: u32,
    },
    Get {
        id: String,
    },
    Delete {
        id: String,
    },
}
