//! 集成测试公共辅助函数
//!
//! 每个测试使用随机邮箱创建独立用户与商品，可在同一数据库上重复运行。

#![allow(dead_code)]

use std::sync::Arc;

use commerce_shared::database::MIGRATOR;
use order_management::service::dto::{PlaceOrderCommand, PlaceOrderItem};
use order_management::{
    BonusPolicy, BonusService, NotificationDispatcher, NotificationJob, OrderService,
    OrderSource, PaymentType, PointRateProvider, SettingService,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;
use uuid::Uuid;

pub fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

/// 连接数据库并执行迁移
pub async fn setup_pool() -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url())
        .await
        .expect("数据库连接失败");
    MIGRATOR.run(&pool).await.expect("执行迁移失败");
    pool
}

/// 下单服务及其通知队列接收端
pub fn order_service(pool: &PgPool) -> (OrderService, mpsc::Receiver<NotificationJob>) {
    let settings = SettingService::new(pool.clone());
    order_service_with_rates(pool, settings.point_rate_provider())
}

/// 使用指定的兑换比例来源构造下单服务
pub fn order_service_with_rates(
    pool: &PgPool,
    point_rates: Arc<dyn PointRateProvider>,
) -> (OrderService, mpsc::Receiver<NotificationJob>) {
    let (dispatcher, receiver) = NotificationDispatcher::channel(64);
    let service = OrderService::new(pool.clone(), point_rates, BonusPolicy::default(), dispatcher);
    (service, receiver)
}

pub fn bonus_service(pool: &PgPool) -> BonusService {
    BonusService::new(pool.clone(), BonusPolicy::default())
}

pub fn settings(pool: &PgPool) -> Arc<SettingService> {
    Arc::new(SettingService::new(pool.clone()))
}

// ==================== 数据准备 ====================

pub async fn seed_user(pool: &PgPool, referred_by: Option<i64>, fullname: &str) -> i64 {
    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (email, referred_by, fcm_token) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("{}@test.local", Uuid::new_v4()))
    .bind(referred_by)
    .bind(format!("fcm-{}", Uuid::new_v4()))
    .fetch_one(pool)
    .await
    .expect("插入用户失败");

    sqlx::query(
        "INSERT INTO user_details (user_id, fullname, phone_number) VALUES ($1, $2, '0812')",
    )
    .bind(user_id)
    .bind(fullname)
    .execute(pool)
    .await
    .expect("插入用户详情失败");

    user_id
}

pub async fn seed_points(pool: &PgPool, user_id: i64, points: i64) {
    sqlx::query("INSERT INTO user_points (user_id, points) VALUES ($1, $2)")
        .bind(user_id)
        .bind(points)
        .execute(pool)
        .await
        .expect("插入积分失败");
}

/// 创建商品及一个可售规格，返回规格 ID
pub async fn seed_unit(pool: &PgPool, stock: i32, price: i64) -> i64 {
    let product_id: i64 =
        sqlx::query_scalar("INSERT INTO products (name) VALUES ($1) RETURNING id")
            .bind(format!("Sayur {}", Uuid::new_v4()))
            .fetch_one(pool)
            .await
            .expect("插入商品失败");

    sqlx::query_scalar(
        r#"
        INSERT INTO product_items (product_id, stock, price, point_price, pack_quantity, unit)
        VALUES ($1, $2, $3, $3 / 1000, 1, 'kg')
        RETURNING id
        "#,
    )
    .bind(product_id)
    .bind(stock)
    .bind(price)
    .fetch_one(pool)
    .await
    .expect("插入规格失败")
}

pub async fn seed_cart(pool: &PgPool, user_id: i64, unit_id: i64) {
    sqlx::query("INSERT INTO carts (user_id, product_item_id, quantity) VALUES ($1, $2, 1)")
        .bind(user_id)
        .bind(unit_id)
        .execute(pool)
        .await
        .expect("插入购物车失败");
}

pub async fn stock_of(pool: &PgPool, unit_id: i64) -> i32 {
    sqlx::query_scalar("SELECT stock FROM product_items WHERE id = $1")
        .bind(unit_id)
        .fetch_one(pool)
        .await
        .expect("查询库存失败")
}

pub async fn points_of(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT points FROM user_points WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("查询积分失败")
}

pub async fn count_orders_with_key(pool: &PgPool, key: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE idempotency_key = $1")
        .bind(key)
        .fetch_one(pool)
        .await
        .expect("查询订单失败")
}

pub async fn count_bonuses_for_order(pool: &PgPool, order_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM affiliate_bonuses WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .expect("查询奖励失败")
}

// ==================== 命令构造 ====================

pub fn item(unit_id: i64, quantity: i32, unit_price: i64) -> PlaceOrderItem {
    PlaceOrderItem {
        product_item_id: unit_id,
        product_name: format!("Item {unit_id}"),
        unit_price,
        quantity,
        weight: 1,
        unit: "kg".into(),
        line_total: unit_price * i64::from(quantity),
    }
}

pub fn cod_command(
    user_id: i64,
    grand_total: i64,
    items: Vec<PlaceOrderItem>,
) -> PlaceOrderCommand {
    PlaceOrderCommand {
        user_id,
        idempotency_key: Uuid::new_v4().to_string(),
        payment_type: PaymentType::Cod,
        source: OrderSource::Direct,
        payment_method: "COD".into(),
        invoice_number: format!("INV-{}", Uuid::new_v4().simple()),
        price_total: grand_total,
        point_total: 0,
        shipping_cost: 0,
        grand_total,
        items,
    }
}

pub fn points_command(
    user_id: i64,
    grand_total: i64,
    items: Vec<PlaceOrderItem>,
) -> PlaceOrderCommand {
    PlaceOrderCommand {
        payment_type: PaymentType::Points,
        payment_method: "POIN".into(),
        price_total: 0,
        point_total: grand_total,
        ..cod_command(user_id, grand_total, items)
    }
}
