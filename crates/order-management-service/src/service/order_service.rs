//! 下单服务
//!
//! 处理下单的核心业务逻辑，包括：
//! - 幂等处理（同一幂等键只生成一笔订单）
//! - 积分余额检查与扣减
//! - 库存锁定与扣减
//! - 订单与明细写入、购物车清理
//! - 推荐奖励生成
//!
//! ## 下单流程
//!
//! 1. 幂等检查 -> 2. 参数校验 -> 3. 奖励门槛 -> 4. 用户与积分
//!    -> 5. 订单写入 -> 6. 明细与库存 -> 7. 购物车 -> 8. 推荐奖励
//!    -> 9. 提交事务 -> 10. 派发通知
//!
//! 任一步失败事务随 `Transaction` 析构回滚，不会留下部分订单。

use std::sync::Arc;
use std::time::Instant;

use sqlx::{PgConnection, PgPool};
use tracing::{error, info, instrument, warn};

use commerce_shared::observability::metrics;

use super::bonus_walk::create_referral_bonuses;
use super::dto::{PlaceOrderCommand, PlaceOrderItem, PlacedOrder};
use super::policy::BonusPolicy;
use crate::error::{OrderError, Result};
use crate::models::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderSource, OrderStatus, OrderWithItems,
    PaymentStatus, PaymentType, generate_order_code,
};
use crate::notification::{
    NotificationDispatcher, NotificationJob,
    types::{CustomerContact, OrderPlacedNotice, StatusChangedNotice},
};
use crate::repository::{InventoryRepository, OrderRepository, PointRateProvider, UserRepository};

/// orders.idempotency_key 唯一约束名
const IDEMPOTENCY_CONSTRAINT: &str = "orders_idempotency_key_key";

/// 下单与订单管理服务
pub struct OrderService {
    pool: PgPool,
    order_repo: Arc<OrderRepository>,
    user_repo: Arc<UserRepository>,
    point_rates: Arc<dyn PointRateProvider>,
    policy: BonusPolicy,
    notifications: NotificationDispatcher,
}

impl OrderService {
    pub fn new(
        pool: PgPool,
        point_rates: Arc<dyn PointRateProvider>,
        policy: BonusPolicy,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            order_repo: Arc::new(OrderRepository::new(pool.clone())),
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            pool,
            point_rates,
            policy,
            notifications,
        }
    }

    /// 下单
    ///
    /// 幂等键已存在时返回原订单（`replayed = true`），不做任何修改。
    #[instrument(
        skip(self, command),
        fields(
            user_id = command.user_id,
            idempotency_key = %command.idempotency_key,
            payment = command.payment_type.as_str(),
            source = command.source.as_str(),
        )
    )]
    pub async fn place_order(&self, command: PlaceOrderCommand) -> Result<PlacedOrder> {
        let start = Instant::now();
        let result = self.execute_placement(&command).await;

        let status = match &result {
            Ok(placed) if placed.replayed => "replayed",
            Ok(_) => "created",
            Err(e) if e.is_business_error() => "rejected",
            Err(_) => "failed",
        };
        metrics::record_order_placement(
            command.payment_type.as_str(),
            command.source.as_str(),
            status,
            start.elapsed().as_secs_f64(),
        );

        match &result {
            Ok(placed) if placed.replayed => {
                info!(order_id = placed.order.id, "幂等请求，返回已存在的订单");
            }
            Ok(placed) => info!(
                order_id = placed.order.id,
                order_code = %placed.order.order_code,
                grand_total = placed.order.grand_total,
                item_count = placed.items.len(),
                bonus_count = placed.bonuses.len(),
                "下单成功"
            ),
            Err(e) if e.is_business_error() => warn!(error = %e, "下单被拒绝"),
            Err(e) => error!(error = %e, "下单失败"),
        }

        result
    }

    /// 按幂等键查询订单
    #[instrument(skip(self))]
    pub async fn check_order(&self, idempotency_key: &str) -> Result<Order> {
        if idempotency_key.trim().is_empty() {
            return Err(OrderError::MissingIdempotencyKey);
        }

        self.order_repo
            .get_order_by_idempotency_key(idempotency_key)
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// 订单详情（含明细）
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<OrderWithItems> {
        let order = self
            .order_repo
            .get_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        let items = self.order_repo.list_items(order.id).await?;

        Ok(OrderWithItems { order, items })
    }

    /// 用户全部订单，最新在前
    #[instrument(skip(self))]
    pub async fn list_user_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        self.order_repo.list_by_user(user_id).await
    }

    /// 用户已送达订单
    #[instrument(skip(self))]
    pub async fn list_delivered_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        self.order_repo
            .list_by_user_and_status(user_id, OrderStatus::Delivered)
            .await
    }

    /// 更新订单履约状态
    ///
    /// 送达同时将支付状态置为已付款；提交后向下单用户推送状态变更。
    #[instrument(skip(self), fields(status = status.as_str()))]
    pub async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        OrderRepository::get_order_for_update_in_tx(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        let payment_status = (status == OrderStatus::Delivered).then_some(PaymentStatus::Paid);
        let order =
            OrderRepository::update_status_in_tx(&mut tx, order_id, status, payment_status).await?;

        tx.commit().await?;

        info!(order_id, order_code = %order.order_code, "订单状态已更新");

        match self.user_repo.get_profile(order.user_id).await {
            Ok(profile) => {
                self.notifications
                    .enqueue(NotificationJob::StatusChanged(StatusChangedNotice {
                        order_id: order.id,
                        order_code: order.order_code.clone(),
                        user_id: order.user_id,
                        status,
                        fcm_token: profile.and_then(|p| p.fcm_token),
                    }));
            }
            Err(e) => warn!(order_id, error = %e, "读取用户资料失败，跳过状态推送"),
        }

        Ok(order)
    }

    /// 删除订单及其明细
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        OrderRepository::get_order_for_update_in_tx(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        let removed_items = OrderRepository::delete_items_in_tx(&mut tx, order_id).await?;
        OrderRepository::delete_order_in_tx(&mut tx, order_id).await?;

        tx.commit().await?;

        info!(order_id, removed_items, "订单已删除");
        Ok(())
    }

    // ==================== 私有方法 ====================

    async fn execute_placement(&self, command: &PlaceOrderCommand) -> Result<PlacedOrder> {
        if command.idempotency_key.trim().is_empty() {
            return Err(OrderError::MissingIdempotencyKey);
        }

        let mut tx = self.pool.begin().await?;

        // 1. 幂等检查
        if let Some(existing) =
            OrderRepository::get_by_idempotency_key_in_tx(&mut tx, &command.idempotency_key)
                .await?
        {
            tx.commit().await?;
            return self.replay(existing).await;
        }

        // 2. 参数校验
        validate_command(command)?;

        // 3. 用户与积分
        let profile = UserRepository::get_profile_in_tx(&mut tx, command.user_id)
            .await?
            .ok_or(OrderError::UserNotFound(command.user_id))?;

        if command.payment_type == PaymentType::Points {
            let balance = deduct_points(&mut tx, command.user_id, command.grand_total).await?;
            info!(remaining = balance, "积分已扣减");
        }

        // 4. 订单
        let new_order = build_order(command);
        let order = match OrderRepository::create_order_in_tx(&mut tx, &new_order).await {
            Ok(order) => order,
            Err(e) if is_idempotency_conflict(&e) => {
                // 并发的同键请求已先提交
                tx.rollback().await?;
                warn!("幂等键并发冲突，返回先提交的订单");
                return self.replay_by_key(&command.idempotency_key).await;
            }
            Err(e) => return Err(e),
        };

        // 5. 明细与库存
        let mut items = Vec::with_capacity(command.items.len());
        for item in &command.items {
            items.push(reserve_item(&mut tx, order.id, item).await?);
        }

        // 6. 购物车
        if command.source == OrderSource::Cart {
            let unit_ids: Vec<i64> = command.items.iter().map(|i| i.product_item_id).collect();
            let cleared =
                OrderRepository::clear_cart_items_in_tx(&mut tx, command.user_id, &unit_ids)
                    .await?;
            info!(cleared, "购物车已清理");
        }

        // 7. 推荐奖励（积分订单可能需要读取兑换比例）
        let qualifies = qualifies_for_bonus(
            &self.policy,
            self.point_rates.as_ref(),
            command.payment_type,
            command.grand_total,
        )
        .await?;
        let bonuses = if qualifies {
            create_referral_bonuses(
                &mut tx,
                &self.policy,
                &profile.as_user(),
                order.id,
                order.created_at,
            )
            .await?
        } else {
            Vec::new()
        };

        // 8. 提交
        tx.commit().await?;

        for bonus in &bonuses {
            metrics::record_bonus_created(bonus.bonus_level);
        }

        // 10. 通知
        self.notifications
            .enqueue(NotificationJob::OrderPlaced(OrderPlacedNotice {
                order: order.clone(),
                items: items.clone(),
                customer: CustomerContact {
                    fullname: profile.fullname,
                    phone_number: profile.phone_number,
                    fcm_token: profile.fcm_token,
                },
            }));

        Ok(PlacedOrder {
            order,
            items,
            bonuses,
            replayed: false,
        })
    }

    async fn replay(&self, order: Order) -> Result<PlacedOrder> {
        let items = self.order_repo.list_items(order.id).await?;
        Ok(PlacedOrder {
            order,
            items,
            bonuses: Vec::new(),
            replayed: true,
        })
    }

    async fn replay_by_key(&self, idempotency_key: &str) -> Result<PlacedOrder> {
        let order = self
            .order_repo
            .get_order_by_idempotency_key(idempotency_key)
            .await?
            .ok_or_else(|| {
                OrderError::Internal(format!("幂等键 {idempotency_key} 冲突但未找到订单"))
            })?;

        self.replay(order).await
    }
}

/// 事务外可完成的参数校验
pub(crate) fn validate_command(command: &PlaceOrderCommand) -> Result<()> {
    if command.payment_type == PaymentType::Points && command.grand_total <= 0 {
        return Err(OrderError::NonPositiveTotal);
    }

    if command.items.is_empty() {
        return Err(OrderError::EmptyItems);
    }

    if let Some(item) = command.items.iter().find(|i| i.quantity <= 0) {
        return Err(OrderError::Validation(format!(
            "Quantity for {} must be greater than 0",
            item.product_name
        )));
    }

    Ok(())
}

/// 判断订单是否达到推荐奖励门槛
///
/// 积分订单低于读取下限时不查询兑换比例；需要时比例缺失或非法视为系统错误
pub(crate) async fn qualifies_for_bonus(
    policy: &BonusPolicy,
    point_rates: &dyn PointRateProvider,
    payment_type: PaymentType,
    grand_total: i64,
) -> Result<bool> {
    match payment_type {
        PaymentType::Cod => Ok(policy.qualifies_cash(grand_total)),
        PaymentType::Points => {
            if !policy.needs_point_rate(grand_total) {
                return Ok(false);
            }
            let rate = point_rates
                .current_rate()
                .await?
                .ok_or(OrderError::PointRateUnavailable)?;
            Ok(policy.qualifies_points(grand_total, rate))
        }
    }
}

fn build_order(command: &PlaceOrderCommand) -> NewOrder {
    NewOrder {
        order_code: generate_order_code(),
        idempotency_key: command.idempotency_key.clone(),
        user_id: command.user_id,
        invoice_number: command.invoice_number.clone(),
        payment_method: command.payment_method.clone(),
        payment_type: command.payment_type,
        price_total: command.price_total,
        point_total: command.point_total,
        shipping_cost: command.shipping_cost,
        grand_total: command.grand_total,
        payment_status: command.payment_type.initial_payment_status(),
        status: OrderStatus::Pending,
    }
}

/// 锁定积分行并扣减，返回扣减后的余额
async fn deduct_points(conn: &mut PgConnection, user_id: i64, amount: i64) -> Result<i64> {
    let points = UserRepository::get_points_for_update_in_tx(&mut *conn, user_id)
        .await?
        .ok_or(OrderError::UserPointsNotFound(user_id))?;

    if points.points <= 0 {
        return Err(OrderError::NoPoints);
    }
    if points.points < amount {
        return Err(OrderError::InsufficientPoints {
            balance: points.points,
            required: amount,
        });
    }

    UserRepository::deduct_points_in_tx(conn, user_id, amount).await
}

/// 锁定规格、校验并扣减库存，写入明细快照
async fn reserve_item(
    conn: &mut PgConnection,
    order_id: i64,
    item: &PlaceOrderItem,
) -> Result<OrderItem> {
    let unit = InventoryRepository::get_unit_for_update_in_tx(&mut *conn, item.product_item_id)
        .await?
        .ok_or(OrderError::InventoryUnitNotFound(item.product_item_id))?;

    let insufficient = || OrderError::InsufficientStock {
        product_name: item.product_name.clone(),
        available: unit.stock,
    };

    if !unit.can_fulfil(item.quantity) {
        return Err(insufficient());
    }
    if !InventoryRepository::decrement_stock_in_tx(&mut *conn, unit.id, item.quantity).await? {
        return Err(insufficient());
    }

    OrderRepository::create_item_in_tx(
        conn,
        order_id,
        &NewOrderItem {
            product_item_id: item.product_item_id,
            product_name: item.product_name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            weight: item.weight,
            unit: item.unit.clone(),
            line_total: item.line_total,
        },
    )
    .await
}

fn is_idempotency_conflict(err: &OrderError) -> bool {
    match err {
        OrderError::Database(sqlx::Error::Database(db_err)) => {
            db_err.constraint() == Some(IDEMPOTENCY_CONSTRAINT)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockPointRateProvider;

    fn command(payment_type: PaymentType, grand_total: i64) -> PlaceOrderCommand {
        PlaceOrderCommand {
            user_id: 1,
            idempotency_key: "idem-1".into(),
            payment_type,
            source: OrderSource::Direct,
            payment_method: "COD".into(),
            invoice_number: "INV-1".into(),
            price_total: grand_total,
            point_total: 0,
            shipping_cost: 0,
            grand_total,
            items: vec![PlaceOrderItem {
                product_item_id: 10,
                product_name: "Tomat".into(),
                unit_price: grand_total,
                quantity: 1,
                weight: 1,
                unit: "kg".into(),
                line_total: grand_total,
            }],
        }
    }

    #[test]
    fn test_validate_rejects_empty_items() {
        let mut cmd = command(PaymentType::Cod, 50_000);
        cmd.items.clear();
        assert!(matches!(validate_command(&cmd), Err(OrderError::EmptyItems)));
    }

    #[test]
    fn test_validate_rejects_non_positive_points_total() {
        let cmd = command(PaymentType::Points, 0);
        assert!(matches!(
            validate_command(&cmd),
            Err(OrderError::NonPositiveTotal)
        ));

        // 货到付款不检查总额
        assert!(validate_command(&command(PaymentType::Cod, 0)).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let mut cmd = command(PaymentType::Cod, 50_000);
        cmd.items[0].quantity = 0;
        assert!(matches!(
            validate_command(&cmd),
            Err(OrderError::Validation(msg)) if msg.contains("Tomat")
        ));
    }

    #[test]
    fn test_build_order_initial_states() {
        let order = build_order(&command(PaymentType::Cod, 250_000));
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_code.starts_with("GS"));

        let order = build_order(&command(PaymentType::Points, 300));
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_non_database_error_is_not_conflict() {
        assert!(!is_idempotency_conflict(&OrderError::EmptyItems));
        assert!(!is_idempotency_conflict(&OrderError::Database(
            sqlx::Error::RowNotFound
        )));
    }

    #[tokio::test]
    async fn test_cash_threshold_ignores_point_rate() {
        let mut rates = MockPointRateProvider::new();
        rates.expect_current_rate().never();
        let policy = BonusPolicy::default();

        assert!(
            qualifies_for_bonus(&policy, &rates, PaymentType::Cod, 200_000)
                .await
                .unwrap()
        );
        assert!(
            !qualifies_for_bonus(&policy, &rates, PaymentType::Cod, 199_999)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_points_below_floor_skips_rate_lookup() {
        let mut rates = MockPointRateProvider::new();
        rates.expect_current_rate().never();

        let qualifies =
            qualifies_for_bonus(&BonusPolicy::default(), &rates, PaymentType::Points, 199)
                .await
                .unwrap();
        assert!(!qualifies);
    }

    #[tokio::test]
    async fn test_points_converted_with_rate() {
        let mut rates = MockPointRateProvider::new();
        rates
            .expect_current_rate()
            .times(2)
            .returning(|| Ok(Some(1_000)));
        let policy = BonusPolicy::default();

        assert!(
            qualifies_for_bonus(&policy, &rates, PaymentType::Points, 200)
                .await
                .unwrap()
        );
        assert!(
            qualifies_for_bonus(&policy, &rates, PaymentType::Points, 250)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_points_below_converted_threshold() {
        let mut rates = MockPointRateProvider::new();
        rates.expect_current_rate().times(1).returning(|| Ok(Some(500)));

        // 300 积分 * 500 = 150,000
        let qualifies =
            qualifies_for_bonus(&BonusPolicy::default(), &rates, PaymentType::Points, 300)
                .await
                .unwrap();
        assert!(!qualifies);
    }

    #[tokio::test]
    async fn test_missing_point_rate_is_system_error() {
        let mut rates = MockPointRateProvider::new();
        rates.expect_current_rate().returning(|| Ok(None));

        let err = qualifies_for_bonus(&BonusPolicy::default(), &rates, PaymentType::Points, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::PointRateUnavailable));
        assert!(!err.is_business_error());
    }

    #[tokio::test]
    async fn test_invalid_point_rate_propagates() {
        let mut rates = MockPointRateProvider::new();
        rates
            .expect_current_rate()
            .returning(|| Err(OrderError::InvalidPointRate("abc".into())));

        let err = qualifies_for_bonus(&BonusPolicy::default(), &rates, PaymentType::Points, 500)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid hargaPoin value: abc");
    }
}
