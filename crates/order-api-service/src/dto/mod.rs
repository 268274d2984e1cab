//! 数据传输对象
//!
//! 请求体沿用移动端既有的字段命名（印尼语 camelCase）

pub mod request;
pub mod response;

pub use request::{
    CheckOrderQuery, ClaimBonusRequest, CreateOrderRequest, OrderItemRequest,
    SetPointRateRequest, UpdateOrderStatusRequest,
};
pub use response::{ApiResponse, PointRateDto, TotalBonusDto};
