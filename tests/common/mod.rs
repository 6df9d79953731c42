//! Controllers, error handlers and decorators shared by the integration tests.
#![allow(dead_code)]

use anyhow::Result;
use bridgeapi::middleware::{BridgeService, ServiceDecorator};
use bridgeapi::params::{ExternalEnum, Param};
use bridgeapi::{BridgeResponse, Controller, ErrorHandler, RequestContext, RouteSpec};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const USERS_BASE: &str = "api/v1/users";
pub const PRODUCTS_BASE: &str = "api/v1/products";
pub const PAYMENTS_BASE: &str = "/api/v1/payments";
pub const INTERCEPTOR_BASE: &str = "api/v1/test/interceptor";

#[derive(Debug, Serialize)]
pub struct ApiCommon<T> {
    pub status: i32,
    pub message: String,
    pub data: T,
}

impl<T> ApiCommon<T> {
    pub fn success(data: T) -> Self {
        Self::with_message("success", data)
    }

    pub fn with_message(message: &str, data: T) -> Self {
        Self {
            status: 0,
            message: message.to_string(),
            data,
        }
    }
}

/// Serialized as `{}`.
#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Admin,
    Seller,
    Buyer,
}

impl UserType {
    pub fn value(self) -> i64 {
        match self {
            UserType::Admin => 0,
            UserType::Seller => 1,
            UserType::Buyer => 3,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        [UserType::Admin, UserType::Seller, UserType::Buyer]
            .into_iter()
            .find(|t| t.value() == value)
    }
}

impl ExternalEnum for UserType {
    const TYPE_NAME: &'static str = "UserType";

    fn from_external(value: &str) -> Option<Self> {
        value.trim().parse().ok().and_then(Self::from_value)
    }
}

impl Serialize for UserType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value())
    }
}

#[derive(Debug, Serialize)]
pub struct UserRes {
    pub id: i64,
    pub name: String,
    pub age: i32,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

/// `type` arrives as a number or a numeric string.
#[derive(Debug, Deserialize)]
pub struct UserReq {
    pub name: String,
    pub age: i32,
    #[serde(rename = "type", deserialize_with = "int_or_string")]
    pub user_type: i64,
}

fn int_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub price: i32,
    pub stock: i32,
}

fn apple(id: i64, stock: i32) -> Product {
    Product {
        id,
        name: "Apple".to_string(),
        price: 100,
        stock,
    }
}

fn john(id: i64, user_type: UserType) -> UserRes {
    UserRes {
        id,
        name: "John".to_string(),
        age: 20,
        user_type,
    }
}

#[derive(Debug, Default)]
pub struct UserController;

impl Controller for UserController {
    fn routes(self: Arc<Self>) -> Vec<RouteSpec> {
        vec![
            RouteSpec::get("/:id")
                .param(Param::path("id").of::<i64>())
                .handle(|mut args| {
                    let id: i64 = args.require(0)?;
                    Ok(ApiCommon::success(john(id, UserType::Seller)))
                }),
            RouteSpec::post("")
                .handle(|_| Ok(ApiCommon::success(john(1, UserType::Admin)))),
            RouteSpec::patch("/:id/user-type")
                .param(Param::path("id").of::<i64>())
                .param(Param::body::<UserReq>())
                .handle(|mut args| {
                    let id: i64 = args.require(0)?;
                    let req: UserReq = args.require(1)?;
                    let user_type = UserType::from_value(req.user_type)
                        .ok_or_else(|| anyhow::anyhow!("unknown user type {}", req.user_type))?;
                    Ok(ApiCommon::success(UserRes {
                        id,
                        name: req.name,
                        age: req.age,
                        user_type,
                    }))
                }),
            RouteSpec::delete("/:id")
                .param(Param::path("id").of::<i64>())
                .handle(|_| Ok(ApiCommon::success(Empty {}))),
            RouteSpec::get("all")
                .param(Param::query("order").of::<String>())
                .handle(|mut args| {
                    let order: Option<String> = args.take(0)?;
                    let mut users = vec![
                        john(1, UserType::Admin),
                        UserRes {
                            id: 2,
                            name: "Jane".to_string(),
                            age: 22,
                            user_type: UserType::Seller,
                        },
                    ];
                    if order.as_deref() == Some("DESC") {
                        users.reverse();
                    }
                    Ok(ApiCommon::success(users))
                }),
            RouteSpec::post("/test/header")
                .param(Param::header("X-Token").of::<String>())
                .param(Param::header("X-Heart-Beat").of::<bool>())
                .handle(|mut args| {
                    let token: Option<String> = args.take(0)?;
                    let heart_beat: Option<bool> = args.take(1)?;
                    Ok(ApiCommon::success(json!({
                        "X-Token": token,
                        "X-Heart-Beat": heart_beat,
                    })))
                }),
            RouteSpec::get("/:id/type/:type")
                .param(Param::path("id").of::<i64>())
                .param(Param::path("type").of_enum::<UserType>())
                .handle(|mut args| {
                    let id: i64 = args.require(0)?;
                    let user_type: UserType = args.require(1)?;
                    Ok(ApiCommon::success(john(id, user_type)))
                }),
        ]
    }
}

#[derive(Debug, Default)]
pub struct ProductController;

impl Controller for ProductController {
    fn routes(self: Arc<Self>) -> Vec<RouteSpec> {
        vec![
            RouteSpec::get("/:id")
                .param(Param::path("id").of::<i64>())
                .handle(|_| Ok(ApiCommon::success(apple(1, 10)))),
            RouteSpec::post("").handle(|_| Ok(ApiCommon::success(apple(1, 10)))),
            RouteSpec::post("/all")
                .param(Param::body::<Vec<Product>>())
                .handle(|mut args| {
                    let products: Vec<Product> = args.require(0)?;
                    let data: Vec<Product> = products
                        .into_iter()
                        .zip(1..)
                        .map(|(p, id)| Product { id, ..p })
                        .collect();
                    Ok(ApiCommon::success(data))
                }),
            RouteSpec::patch("/:id/stock/:stock")
                .param(Param::path("id").of::<i64>())
                .param(Param::path("stock").of::<i32>())
                .handle(|mut args| {
                    let id: i64 = args.require(0)?;
                    let stock: i32 = args.require(1)?;
                    Ok(ApiCommon::success(apple(id, stock)))
                }),
            RouteSpec::delete("/:id")
                .param(Param::path("id").of::<i64>())
                .handle(|_| Ok(ApiCommon::with_message("delete success", Empty {}))),
        ]
    }
}

#[derive(Debug)]
pub struct PaymentError {
    pub payment_type: String,
    pub message: String,
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PaymentError {}

#[derive(Debug, Default)]
pub struct PaymentController;

impl Controller for PaymentController {
    fn routes(self: Arc<Self>) -> Vec<RouteSpec> {
        vec![
            RouteSpec::get("").handle(|_| -> Result<()> { anyhow::bail!("test throwable") }),
            RouteSpec::post("").handle(|_| -> Result<()> {
                let declined = PaymentError {
                    payment_type: "카드".to_string(),
                    message: "사용이 불가능한 카드입니다.".to_string(),
                };
                Err(anyhow::Error::new(declined).context("payment gateway call"))
            }),
        ]
    }
}

/// Matches [`PaymentError`] anywhere in the error chain.
pub struct ServiceErrorHandler;

impl ErrorHandler for ServiceErrorHandler {
    fn handle(&self, cause: &anyhow::Error) -> Option<Value> {
        let payment = cause.downcast_ref::<PaymentError>()?;
        Some(json!({
            "status": 500,
            "message": format!("[ {} ] 결제에 실패했습니다.\n{}", payment.payment_type, payment.message),
            "data": {
                "message": payment.message,
                "errorType": "PAYMENT",
                "errorCode": "PAYMENT_ERROR",
                "time": "20240626",
            },
        }))
    }
}

pub fn universal_error_handler(cause: &anyhow::Error) -> Option<Value> {
    Some(json!({
        "status": 500,
        "message": format!("서버 에러가 발생했습니다. {cause}"),
        "data": null,
    }))
}

#[derive(Debug, Default)]
pub struct InterceptorTestController;

impl Controller for InterceptorTestController {
    fn routes(self: Arc<Self>) -> Vec<RouteSpec> {
        vec![
            RouteSpec::get("").handle(|_| Ok("reach test interceptor get controller")),
            RouteSpec::post("").handle(|_| Ok("reach test interceptor post controller")),
            RouteSpec::patch("").handle(|_| Ok("reach test interceptor patch controller")),
            RouteSpec::delete("").handle(|_| Ok("reach test interceptor delete controller")),
        ]
    }
}

/// Short-circuits requests to the interceptor test controller for one verb.
pub struct TestInterceptor {
    pub label: &'static str,
    pub intercepts: fn(&RequestContext) -> bool,
    pub passed: AtomicUsize,
}

impl TestInterceptor {
    pub fn new(label: &'static str, intercepts: fn(&RequestContext) -> bool) -> Self {
        Self {
            label,
            intercepts,
            passed: AtomicUsize::new(0),
        }
    }

    /// The three interceptors: GET, POST and PATCH respectively.
    pub fn standard() -> [Arc<TestInterceptor>; 3] {
        [
            Arc::new(Self::new("TestInterceptor1", |ctx| ctx.method.is_get())),
            Arc::new(Self::new("TestInterceptor2", |ctx| ctx.method.is_post())),
            Arc::new(Self::new("TestInterceptor3", |ctx| ctx.method.is_patch())),
        ]
    }

    pub fn passed(&self) -> usize {
        self.passed.load(Ordering::SeqCst)
    }
}

impl ServiceDecorator for TestInterceptor {
    fn serve(&self, ctx: RequestContext, next: &dyn BridgeService) -> Result<BridgeResponse> {
        if ctx.has_segment("test") && ctx.has_segment("interceptor") && (self.intercepts)(&ctx) {
            return Ok(BridgeResponse::new(json!(format!(
                "Intercepted by {} and not reach controller",
                self.label
            ))));
        }
        self.passed.fetch_add(1, Ordering::SeqCst);
        next.serve(ctx)
    }
}

/// Parse a wire response for comparison.
pub fn parse(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|e| panic!("response is not JSON ({e}): {raw}"))
}
