// Copyright 2025 The pgmesh Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command execution across cluster nodes.

mod evaluate;
mod parallel;
mod result_types;
mod sequential;

pub use evaluate::{
    describe_connection_loss, evaluate_result, extract_error_message, DEFAULT_ERROR_MESSAGE,
};
pub use parallel::{ParallelExecutor, DEFAULT_POLL_INTERVAL};
pub use result_types::{
    build_command_batch, CommandSpec, ExecutionResult, ResultCollector, ResultSink,
};
pub use sequential::SequentialExecutor;
