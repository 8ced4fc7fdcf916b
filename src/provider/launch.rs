//! Instance launch parameters and the bootstrap script that brings the render service up.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::CloudburstConfig;
use crate::constants::service;

/// What a freshly created instance must run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub container_image: String,
    pub service_port: u16,
    pub memory_limit: String,
    pub tags: BTreeMap<String, String>,
}

impl LaunchSpec {
    pub fn from_config(config: &CloudburstConfig) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("Purpose".to_string(), "video-generation".to_string());
        tags.insert("ManagedBy".to_string(), "cloudburst".to_string());
        Self {
            container_image: config.provisioning.container_image.clone(),
            service_port: config.service.port,
            memory_limit: config.provisioning.container_memory_limit.clone(),
            tags,
        }
    }

    /// Copy of this spec with one extra tag
    pub fn with_tag(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut spec = self.clone();
        spec.tags.insert(key.into(), value.into());
        spec
    }

    /// First-boot shell script: install docker, pull and run the service container, then
    /// wait until its health endpoint answers.
    pub fn bootstrap_script(&self) -> String {
        let port = self.service_port;
        let image = &self.container_image;
        let memory = &self.memory_limit;
        let health = service::HEALTH_PATH;
        format!(
            r#"#!/bin/bash
set -e
exec > >(tee /var/log/user-data.log) 2>&1

yum update -y
yum install -y docker
systemctl start docker
systemctl enable docker
usermod -a -G docker ec2-user

docker pull {image}
docker run -d \
  --name video-api \
  -p {port}:{port} \
  --memory={memory} \
  --restart unless-stopped \
  {image}

for i in $(seq 1 60); do
  if curl -sf http://localhost:{port}{health} > /dev/null; then
    echo "render service healthy"
    exit 0
  fi
  sleep 5
done
echo "render service did not become healthy"
"#
        )
    }
}
