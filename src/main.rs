/*!
 * User API - 用户服务
 *
 * 应用程序主入口点，负责：
 * - 加载环境配置并初始化日志
 * - 执行启动引导（连接数据库、迁移、初始化管理员账号）
 * - 启动 HTTP 服务
 *
 * 退出码：1 = 连接失败，2 = 迁移失败，3 = 管理员账号创建失败，4 = HTTP 服务失败
 */

use std::process;
use tracing::{error, info};
use user_api::{bootstrap, config::Config, logging, server::Server};

const SERVER_FAILURE_EXIT_CODE: i32 = 4;

#[tokio::main]
async fn main() {
    println!("User API v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            let err = bootstrap::BootstrapError::Config(err);
            println!("{err}");
            process::exit(err.exit_code());
        }
    };

    if let Err(err) = logging::init_logging(&config.log_level, config.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {err}");
        process::exit(1);
    }

    let bootstrapped = match bootstrap::run(&config).await {
        Ok(done) => done,
        Err(err) => {
            error!("{err}");
            process::exit(err.exit_code());
        }
    };
    info!("Bootstrap completed, starting API server");

    if let Err(err) = Server::new(config, bootstrapped.db).run().await {
        error!("{err}");
        process::exit(SERVER_FAILURE_EXIT_CODE);
    }
}
