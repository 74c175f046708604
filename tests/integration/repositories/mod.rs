// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod audit_repository_test;
pub mod geo_grid_repository_test;
pub mod job_queue_test;
pub mod scan_repository_test;
