//! Build the full infrastructure stack and export it

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use terragen_core::{
    BuildConfig, DependencyInfo, ExportedDocument, OrchestrationResult, Orchestrator,
    ValidationReport,
};
use terragen_modules::{
    AppSpec, ClusterModule, ComputeModule, ComputeSpec, IdentityModule, NetworkStackBuilder, Tags,
};
use tracing::info;

const NAMESPACES: [&str; 3] = ["kube-system", "default", "monitoring"];

/// Assembles the whole stack and drives orchestration
pub struct InfrastructureBuilder {
    config: BuildConfig,
    orchestrator: Orchestrator,
    network_resource_count: usize,
    namespace_count: usize,
    application_count: usize,
}

impl InfrastructureBuilder {
    /// Build every module for the configured project and register it with
    /// the orchestrator
    pub fn assemble(config: &BuildConfig) -> Result<Self> {
        let tags = config.tags();
        let vpc_name = config.vpc_name();
        let cluster_name = config.cluster_name();

        // Network stack with the configured number of private subnets.
        let network = NetworkStackBuilder::new(config.project.clone())
            .with_private_network(
                &vpc_name,
                config.network.subnet_count,
                &config.network.vpc_cidr,
                &tags,
            )
            .build();

        // Kubernetes cluster on top of the injected network.
        let mut cluster = ClusterModule::new(config.project.clone());
        cluster.attach_network(&network);
        cluster.create_cluster(&cluster_name, &config.cluster, &tags)?;
        for namespace in NAMESPACES {
            cluster.add_namespace(namespace, &managed_labels())?;
        }
        cluster.add_application(&AppSpec {
            name: "nginx-demo".to_string(),
            namespace: "default".to_string(),
            image: "nginx:1.21".to_string(),
            replicas: 2,
            ports: vec![80],
            environment: BTreeMap::new(),
        })?;
        cluster.add_application(&AppSpec {
            name: "prometheus".to_string(),
            namespace: "monitoring".to_string(),
            image: "prom/prometheus:latest".to_string(),
            replicas: 1,
            ports: vec![9090],
            environment: BTreeMap::new(),
        })?;

        // Extra compute: a bastion host and a monitoring container.
        let mut compute = ComputeModule::new(config.project.clone());
        let mut bastion_tags = tags.clone();
        bastion_tags.insert("Role".to_string(), "BastionHost".to_string());
        compute.add_spec(&ComputeSpec::VirtualMachine {
            name: "bastion-host".to_string(),
            instance_type: "t3.micro".to_string(),
            subnet_name: network.subnet_names().first().cloned(),
            tags: bastion_tags,
        });
        let mut monitoring_tags = tags.clone();
        monitoring_tags.insert("Role".to_string(), "Monitoring".to_string());
        compute.add_spec(&ComputeSpec::Container {
            name: "grafana".to_string(),
            image: "grafana/grafana:latest".to_string(),
            ports: vec![3000],
            environment: BTreeMap::from([(
                "GF_SECURITY_ADMIN_PASSWORD".to_string(),
                "admin".to_string(),
            )]),
            tags: monitoring_tags,
        });

        // Identity bundle for the standalone compute resources.
        let mut identity = IdentityModule::new(format!("{}_identity", config.project));
        identity.add_compute_rbac("bastion-host", &tags);

        let network_resource_count = network.network_resources().len();
        let namespace_count = cluster.namespace_count();
        let application_count = cluster.application_count();

        let mut orchestrator = Orchestrator::new(config.project.clone());
        orchestrator.register_network(Arc::new(network));
        orchestrator.register_compute(Arc::new(compute), None);
        orchestrator.register_identity(Arc::new(identity), None);
        orchestrator.register_cluster(Arc::new(cluster), None);

        Ok(Self {
            config: config.clone(),
            orchestrator,
            network_resource_count,
            namespace_count,
            application_count,
        })
    }

    /// Wiring validation report for the assembled stack
    pub fn validate(&self) -> ValidationReport {
        self.orchestrator.validate()
    }

    /// Diagnostic snapshot of the assembled wiring
    pub fn dependency_info(&self) -> DependencyInfo {
        self.orchestrator.container().dependency_info()
    }

    /// Orchestrate, merge and summarize
    pub fn finish(mut self) -> Result<BuildOutput> {
        let result = self.orchestrator.orchestrate()?;
        let document = result.merged_document();

        let summary = InfrastructureSummary {
            project: ProjectSummary {
                name: self.config.project.clone(),
                environment: self.config.environment.clone(),
                region: self.config.region.clone(),
            },
            network: NetworkSummary {
                vpc_name: self.config.vpc_name(),
                vpc_cidr: self.config.network.vpc_cidr.clone(),
                subnet_count: self.config.network.subnet_count,
                resource_count: self.network_resource_count,
            },
            kubernetes: ClusterSummary {
                cluster_name: self.config.cluster_name(),
                // Workers plus the master node.
                node_count: self.config.cluster.node_count + 1,
                namespaces: self.namespace_count,
                applications: self.application_count,
            },
            dependency_analysis: result.dependency_info.clone(),
            total_resources: document.len(),
        };

        info!(
            "built {} resources across {} modules",
            document.len(),
            result.total_modules
        );

        Ok(BuildOutput {
            document,
            summary,
            result,
        })
    }
}

/// Everything one `generate` run produces
pub struct BuildOutput {
    /// The merged resource document
    pub document: ExportedDocument,
    /// The human-oriented build summary
    pub summary: InfrastructureSummary,
    /// The raw orchestration result
    pub result: OrchestrationResult,
}

/// Build summary written next to the exported document
#[derive(Debug, Clone, Serialize)]
pub struct InfrastructureSummary {
    /// Project identification
    pub project: ProjectSummary,
    /// Network figures
    pub network: NetworkSummary,
    /// Cluster figures
    pub kubernetes: ClusterSummary,
    /// Dependency wiring snapshot
    pub dependency_analysis: DependencyInfo,
    /// Total resource records in the merged document
    pub total_resources: usize,
}

/// Project identification in the summary
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    /// Project name
    pub name: String,
    /// Deployment environment
    pub environment: String,
    /// Target region
    pub region: String,
}

/// Network figures in the summary
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    /// VPC name
    pub vpc_name: String,
    /// VPC CIDR block
    pub vpc_cidr: String,
    /// Number of subnets
    pub subnet_count: usize,
    /// Number of network resource records (RBAC excluded)
    pub resource_count: usize,
}

/// Cluster figures in the summary
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    /// Cluster name
    pub cluster_name: String,
    /// Total nodes including the master
    pub node_count: usize,
    /// Number of namespaces
    pub namespaces: usize,
    /// Number of applications
    pub applications: usize,
}

/// Write the merged document and its summary into `directory`
pub fn export_files(output: &BuildOutput, directory: &Path) -> Result<()> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("failed to create {}", directory.display()))?;

    let document_path = directory.join("main.tf.json");
    std::fs::write(
        &document_path,
        serde_json::to_string_pretty(&output.document)?,
    )
    .with_context(|| format!("failed to write {}", document_path.display()))?;

    let summary_path = directory.join("infrastructure_summary.json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&output.summary)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    Ok(())
}

/// Entry point for `terragen generate`
pub fn generate(config: &BuildConfig, output: Option<PathBuf>, print_document: bool) -> Result<()> {
    let built = InfrastructureBuilder::assemble(config)?.finish()?;

    for (module, error) in built.result.export_failures() {
        eprintln!("warning: export failed for {module}: {error}");
    }

    if let Some(directory) = output {
        export_files(&built, &directory)?;
        println!(
            "wrote {} resources to {}",
            built.document.len(),
            directory.join("main.tf.json").display()
        );
    }

    if print_document {
        println!("{}", serde_json::to_string_pretty(&built.document)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&built.summary)?);
    }

    Ok(())
}

fn managed_labels() -> Tags {
    Tags::from([("managed-by".to_string(), "terragen".to_string())])
}
