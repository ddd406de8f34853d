use crate::api::leave_request::{
    CreateLeave, DecisionReq, LeaveDetails, LeaveFilter, LeaveListResponse,
};
use crate::api::punch::{EditPunch, PunchHistoryQuery, PunchHistoryResponse, PunchReq};
use crate::api::statistics::{StatisticsQuery, StatisticsResponse, UserStatistics};
use crate::api::user::{CreateUser, UserListResponse, UserQuery};
use crate::model::leave_request::{Decision, LeaveStatus, LeaveType};
use crate::model::punch::{PunchRecord, PunchType};
use crate::model::user::User;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clock-in System API",
        version = "1.0.0",
        description = r#"
## Attendance & Leave Management

This API powers an employee attendance and leave-management system.

### 🔹 Key Features
- **Punch Clock**
  - Daily in/out punches plus the lunchtime step-out/return pair
- **Leave Management**
  - Submit requests with a business-hours duration computed at submission
  - Two-party (HR + manager) approval workflow
  - Deputy handover confirmation
- **Statistics**
  - Approved hours per user and leave type, from the same duration engine

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Privileged operations are gated by a closed role/capability table.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::decide_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::leave_history,
        crate::api::leave_request::deputy_pending,
        crate::api::leave_request::confirm_deputy,

        crate::api::punch::punch,
        crate::api::punch::punch_history,
        crate::api::punch::edit_punch,
        crate::api::punch::delete_punch,

        crate::api::statistics::leave_statistics,

        crate::api::user::create_user,
        crate::api::user::list_users
    ),
    components(
        schemas(
            CreateLeave,
            DecisionReq,
            Decision,
            LeaveType,
            LeaveStatus,
            PunchType,
            LeaveFilter,
            LeaveDetails,
            LeaveListResponse,
            PunchReq,
            EditPunch,
            PunchHistoryQuery,
            PunchHistoryResponse,
            PunchRecord,
            StatisticsQuery,
            StatisticsResponse,
            UserStatistics,
            CreateUser,
            UserQuery,
            UserListResponse,
            User
        )
    ),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Punch", description = "Punch clock APIs"),
        (name = "Statistics", description = "Leave statistics APIs"),
        (name = "Users", description = "User management APIs"),
    )
)]
pub struct ApiDoc;
