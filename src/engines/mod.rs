// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 外部数据服务客户端
//!
//! 实现 `domain::providers` 中定义的抓取、排名和地点服务接口

pub mod http_provider;

pub use http_provider::HttpProviderClient;
