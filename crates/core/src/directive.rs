//! System directive assembly.
//!
//! The directive is built once per session from the merged tool registry and
//! the operations document, and is sent unchanged with every backend call.

use orpheus_tools::ToolRegistry;
use std::fmt;

const DEFAULT_PREAMBLE: &str = "\
You are a senior DevOps engineer with deep, hands-on experience across the whole delivery toolchain.

CAPABILITIES:
- Containers and orchestration: Docker, Kubernetes, Terraform, Ansible and CI/CD pipelines
- Read the operations document below, work out what the team wants done and carry it out
- Monitoring and observability with Grafana, Prometheus, the ELK stack and Datadog
- Google Cloud services including GKE, Cloud Run, Cloud Functions and Cloud Build
- GitHub repositories, workflows, actions and integrations
- System architecture, networking and security
- Linux system access through the command tools to run programs and inspect the machine
- Provisioning virtual machines, connecting to them over SSH and deploying code onto them
- Writing Dockerfiles and workflow files and committing them to the repository (workflows go under .github/)
- When the user just says \"start\", do everything the operations document selects
- For health checks, use the Linux command tool to send an HTTP GET to the application's health endpoint";

const DEFAULT_GUIDELINES: &str = "\
- Introduce yourself as a DevOps expert in your first response
- Use the tools to run commands, save files and navigate directories when needed
- Execute gcloud commands precisely and deal with failures yourself
- Suggest Docker, Kubernetes and infrastructure tooling where it fits
- Point out performance bottlenecks and security issues you notice
- Format answers with clear sections and code blocks where appropriate
- If a command fails, analyse the output and try a fix before asking the user
- If you need input from the user, say exactly what is missing";

/// The fixed instruction text that frames every backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive(String);

impl Directive {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct DirectiveBuilder {
    preamble: String,
    guidelines: String,
}

impl DirectiveBuilder {
    pub fn new() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.to_string(),
            guidelines: DEFAULT_GUIDELINES.to_string(),
        }
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    pub fn with_guidelines(mut self, guidelines: impl Into<String>) -> Self {
        self.guidelines = guidelines.into();
        self
    }

    /// Assemble the directive. Tools are listed in registry order and the
    /// operations document is embedded verbatim.
    pub fn build(&self, registry: &ToolRegistry, operations: &str) -> Directive {
        let mut text = String::with_capacity(
            self.preamble.len() + self.guidelines.len() + operations.len() + 256,
        );

        text.push_str(self.preamble.trim_end());
        text.push_str("\n\nAVAILABLE TOOLS:\n");
        for tool in registry.iter() {
            text.push_str(&format!(
                "- {}: Use this tool when you need to {}\n",
                tool.name(),
                tool.description()
            ));
        }

        text.push_str("\nGUIDELINES:\n");
        text.push_str(self.guidelines.trim_end());
        text.push_str("\n\nConfig File:\n");
        text.push_str(operations);

        Directive(text)
    }
}

impl Default for DirectiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}
