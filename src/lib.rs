//! # Exam Tutor
//!
//! 把学生的数学问题（文字 + 试卷图片）交给大模型解答，再翻译成中文
//!
//! ## 架构设计
//!
//! ### ① 外部接口层（Clients）
//! - `clients/` - 模型、图片探测、网关 HTTP 调用，全部藏在 trait 后面
//! - `ChatModel` / `AssetProbe` / `AnalyzeBackend`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ImageProber` - 按页探测试卷图片
//! - `RequestAssembler` - 组装文字 + 图片
//! - `TutoringGateway` - 解题 → 翻译
//! - `renderer` - 清洗答案、历史记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"问一道题"的完整流程
//! - `TutorSession` - 持有当前试卷、历史、朗读与录音
//!
//! ### ④ 编排层（Orchestration）
//! - `api/` - axum 路由
//! - `app` - 装配依赖并启动服务
//!
//! `speech/` 提供分段朗读与按住说话，由 `TutorSession` 使用

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod speech;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnalyzeRequest, ContentPart, TutorResponse};
pub use services::TutoringGateway;
pub use workflow::TutorSession;
