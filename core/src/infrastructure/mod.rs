// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Infrastructure layer: concrete host adapters, providers, and the
//! process/command/Kubernetes seams they sit on.

pub mod cache;
pub mod command;
pub mod docker_compose;
pub mod kubernetes;
pub mod process;
pub mod process_env;
pub mod providers;

pub use command::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use docker_compose::DockerComposeHostAdapter;
pub use kubernetes::{KubeApiClient, KubernetesApi, KubernetesHostAdapter};
pub use process::ProcessHostAdapter;
pub use process_env::{ProcessEnvironment, ProcessSpec, SystemProcessEnvironment};
pub use providers::{
    build_providers, ConfigServerInfoProvider, KubernetesConfigMapServerInfoProvider,
};
