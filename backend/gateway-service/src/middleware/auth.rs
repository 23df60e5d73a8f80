//! Per-route role enforcement
//!
//! For a governed method the access token cookie is validated by the identity
//! service and the returned role must equal the required one. Ungoverned
//! requests pass through untouched, without a cookie or a network call.

use crate::error::GatewayError;
use crate::identity_client::{TokenValidator, ValidatedUser};
use crate::policy::RoutePolicy;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use crypto_core::correlation::{correlation_id_or_new, HTTP_CORRELATION_ID_HEADER};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Correlation id used for the request's validation call
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

pub struct RoleAuthorization {
    policy: Arc<RoutePolicy>,
    validator: Arc<dyn TokenValidator>,
    cookie_name: Rc<str>,
}

impl RoleAuthorization {
    pub fn new(
        policy: Arc<RoutePolicy>,
        validator: Arc<dyn TokenValidator>,
        cookie_name: &str,
    ) -> Self {
        Self {
            policy,
            validator,
            cookie_name: Rc::from(cookie_name),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleAuthorization
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RoleAuthorizationService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleAuthorizationService {
            service: Rc::new(service),
            policy: self.policy.clone(),
            validator: self.validator.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct RoleAuthorizationService<S> {
    service: Rc<S>,
    policy: Arc<RoutePolicy>,
    validator: Arc<dyn TokenValidator>,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for RoleAuthorizationService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let required = self
            .policy
            .required_role(req.method(), req.path())
            .map(str::to_owned);

        let Some(required) = required else {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        };

        let token = req
            .cookie(&self.cookie_name)
            .map(|cookie| cookie.value().to_owned())
            .filter(|value| !value.is_empty());

        let Some(token) = token else {
            debug!(path = %req.path(), "Governed route called without access token");
            return Box::pin(async move { Ok(reject(req, GatewayError::MissingToken)) });
        };

        let correlation_id = correlation_id_or_new(
            req.headers()
                .get(HTTP_CORRELATION_ID_HEADER)
                .and_then(|value| value.to_str().ok()),
        );

        let service = self.service.clone();
        let validator = self.validator.clone();

        Box::pin(async move {
            let user = match validator.validate(&token, &correlation_id).await {
                Ok(user) => user,
                Err(err) => return Ok(reject(req, err)),
            };

            if user.role != required {
                warn!(
                    user_id = %user.user_id,
                    role = %user.role,
                    required = %required,
                    path = %req.path(),
                    "Role mismatch"
                );
                return Ok(reject(req, GatewayError::Forbidden));
            }

            req.extensions_mut().insert(user);
            req.extensions_mut().insert(CorrelationId(correlation_id));

            Ok(service.call(req).await?.map_into_left_body())
        })
    }
}

fn reject<B>(req: ServiceRequest, err: GatewayError) -> ServiceResponse<EitherBody<B>> {
    req.error_response(err).map_into_right_body()
}

/// Extract the identity attached by [`RoleAuthorization`]
impl FromRequest for ValidatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<ValidatedUser>()
                .cloned()
                .ok_or_else(|| GatewayError::Unauthorized.into()),
        )
    }
}
