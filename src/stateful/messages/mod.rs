// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Stateful messages.
//!
//! One type per message, each implementing its direction's parser trait and
//! [`SerializeMessage`](crate::stateful::serializer_helpers::SerializeMessage).
//!
//! ## Subscriber to broadcaster
//!
//! * [`S2BConfigure`]
//! * [`S2BSubscribeExact`], [`S2BSubscribeGlob`]
//! * [`S2BUnsubscribeExact`], [`S2BUnsubscribeGlob`]
//! * [`S2BNotify`], [`S2BNotifyStream`]
//! * [`S2BContinueReceive`], [`S2BConfirmReceive`]
//!
//! ## Broadcaster to subscriber
//!
//! * [`B2SConfirmConfigure`]
//! * [`B2SConfirmSubscribeExact`], [`B2SConfirmSubscribeGlob`]
//! * [`B2SConfirmUnsubscribeExact`], [`B2SConfirmUnsubscribeGlob`]
//! * [`B2SConfirmNotify`], [`B2SContinueNotify`]
//! * [`B2SReceiveStream`]
//! * [`B2SEnableZstdPreset`], [`B2SEnableZstdCustom`]
//!

pub mod acknowledge;
pub mod configure;
pub mod confirm_subscribe;
pub mod enable_zstd;
pub mod notify;
pub mod stream;
pub mod subscribe;

pub use acknowledge::*;
pub use configure::*;
pub use confirm_subscribe::*;
pub use enable_zstd::*;
pub use notify::{sha512, NotificationHeaders, S2BNotify};
pub use stream::*;
pub use subscribe::*;
