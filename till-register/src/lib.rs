//! Till Register - 餐厅收银台核心
//!
//! # 架构概述
//!
//! - **订单会话** (`register`): 选桌、编辑、防抖同步、无操作自动保存
//! - **本地缓存** (`orders`): redb 保存正在编辑的订单
//! - **分单** (`split`): 按件分摊给多位顾客
//! - **收款** (`payment`): 找零计算、流水记录、退款
//! - **收银班次** (`cash`): 班次对账
//!
//! # 模块结构
//!
//! ```text
//! till-register/src/
//! ├── core/          # 配置、任务调度、id/时钟
//! ├── orders/        # 桌台订单簿、本地缓存
//! ├── register/      # 会话控制器
//! ├── split/         # 分单
//! ├── payment/       # 收款与退款
//! ├── cash/          # 班次对账
//! ├── events.rs      # 事件流
//! └── utils/         # 错误、日志
//! ```

pub mod cash;
pub mod core;
pub mod events;
pub mod orders;
pub mod payment;
pub mod register;
pub mod split;
pub mod utils;

// Re-export 公共类型
pub use self::core::{Clock, IdProvider, RegisterConfig, Scheduler};
pub use events::RegisterEvent;
pub use orders::{LineChange, LineSpec, LocalOrderCache, TableOrders};
pub use payment::{PaymentDraft, PaymentQuote, RefundDraft};
pub use register::{ConfirmOutcome, CurrentOrder, Modal, Mode, PaymentOutcome, Register};
pub use split::{SplitAllocator, SplitSettlement};
pub use utils::{RegisterError, RegisterResult, Severity};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境：加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> anyhow::Result<RegisterConfig> {
    dotenv::dotenv().ok();
    let config = RegisterConfig::from_env();

    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;
    init_logger_with_file(Some(&config.log_level), Some(&log_dir));

    Ok(config)
}
