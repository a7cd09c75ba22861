//! Row-level tests for the report emitter
//!
//! These tests build small topologies and check interval coverage, schema
//! completeness, usage bounds and date-matched overrides on emitted rows.

#[cfg(test)]
mod emitter_tests {
    use crate::config::{
        GeneratorConfig, NamespaceAttributes, NodeAttributes, PodAttributes, UsageByDate,
        VolumeAttributes, VolumeClaimAttributes,
    };
    use crate::models::Topology;
    use crate::registry::NameRegistry;
    use crate::report::{ReportEmitter, ReportKind, ReportRow, ReportWindow};
    use crate::topology::TopologyBuilder;
    use crate::units::{GIB_BYTES, HOUR_SECONDS};
    use chrono::{Duration, NaiveDate};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn build(config: &GeneratorConfig, seed: u64) -> Topology {
        let mut rng = StdRng::seed_from_u64(seed);
        TopologyBuilder::new(config)
            .build(&mut rng, &mut NameRegistry::new())
            .expect("topology should build")
    }

    fn emit(topology: &Topology, start: &str, end: &str, kinds: &[ReportKind], seed: u64) -> Vec<ReportRow> {
        let window = ReportWindow::parse(start, end).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        ReportEmitter::new(topology, window).rows(&mut rng, kinds).collect()
    }

    fn num(row: &ReportRow, column: &str) -> f64 {
        row.get(column).and_then(|c| c.as_f64()).unwrap()
    }

    fn text<'r>(row: &'r ReportRow, column: &str) -> &'r str {
        row.get(column).and_then(|c| c.as_str()).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn usage(values: &[(u32, f64)]) -> Option<UsageByDate> {
        Some(values.iter().map(|(d, v)| (day(*d), *v)).collect())
    }

    /// Every level pinned, usage given for 2024-01-01 and 2024-01-02
    fn pinned_config() -> GeneratorConfig {
        let namespace = NamespaceAttributes {
            namespace_labels: Some("label_environment:qa".into()),
            pods: Some(vec![PodAttributes {
                pod_name: Some("pod-pinned".into()),
                cpu_request: Some(2.0),
                cpu_limit: Some(1.0),
                mem_request_gig: Some(4.0),
                mem_limit_gig: Some(2.0),
                pod_seconds: Some(HOUR_SECONDS),
                labels: Some("label_app:web|label_version:ga".into()),
                cpu_usage: usage(&[(1, 0.5), (2, 0.75)]),
                mem_usage_gig: usage(&[(1, 1.0), (2, 1.5)]),
            }]),
            volumes: Some(vec![VolumeAttributes {
                volume_name: Some("pv-pinned".into()),
                storage_class: Some("gp2".into()),
                volume_request_gig: Some(20),
                labels: Some("label_tier:db".into()),
                volume_claims: Some(vec![VolumeClaimAttributes {
                    volume_claim_name: Some("pvc-pinned".into()),
                    pod_name: Some("pod-pinned".into()),
                    capacity_gig: Some(10),
                    labels: Some("label_claim:data".into()),
                    volume_claim_usage_gig: usage(&[(1, 3.0), (2, 4.0)]),
                }]),
            }]),
        };
        GeneratorConfig {
            nodes: Some(vec![NodeAttributes {
                node_name: Some("node-pinned".into()),
                cpu_cores: Some(4),
                memory_gig: Some(16.0),
                resource_id: Some("i-pinned".into()),
                node_labels: Some("label_nodeclass:compute".into()),
                namespaces: Some(BTreeMap::from([("pinned-ns".to_string(), namespace)])),
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_topology_two_hours() {
        let config = GeneratorConfig {
            max_nodes: 1,
            max_node_namespaces: 1,
            max_node_namespace_pods: 1,
            max_node_namespace_volumes: 0,
            ..Default::default()
        };
        let topology = build(&config, 4);
        let rows = emit(
            &topology,
            "2024-01-01T00:00:00Z",
            "2024-01-01T02:00:00Z",
            &[ReportKind::PodUsage, ReportKind::StorageUsage],
            4,
        );

        let pod_rows: Vec<_> = rows.iter().filter(|r| r.kind() == ReportKind::PodUsage).collect();
        assert_eq!(pod_rows.len(), 2);
        assert_eq!(rows.len(), 2, "no storage rows without volumes");
        assert_eq!(text(pod_rows[0], "interval_start"), "2024-01-01 00:00:00 +0000 UTC");
        assert_eq!(text(pod_rows[0], "interval_end"), "2024-01-01 01:00:00 +0000 UTC");
        assert_eq!(text(pod_rows[1], "interval_start"), "2024-01-01 01:00:00 +0000 UTC");
        assert_eq!(text(pod_rows[1], "interval_end"), "2024-01-01 02:00:00 +0000 UTC");
        assert_eq!(text(pod_rows[0], "report_period_start"), "2024-01-01 00:00:00 +0000 UTC");
        assert_eq!(text(pod_rows[0], "report_period_end"), "2024-02-01 00:00:00 +0000 UTC");
    }

    #[test]
    fn test_interval_coverage_and_order() {
        let topology = build(&GeneratorConfig::default(), 12);
        let nodes = topology.nodes.len();
        let rows = emit(
            &topology,
            "2024-01-01T00:00:00Z",
            "2024-01-01T05:30:00Z",
            &[ReportKind::NodeLabel],
            12,
        );

        assert_eq!(rows.len(), 5 * nodes);
        let starts: Vec<&str> = rows.chunks(nodes).map(|chunk| text(&chunk[0], "interval_start")).collect();
        assert_eq!(
            starts,
            vec![
                "2024-01-01 00:00:00 +0000 UTC",
                "2024-01-01 01:00:00 +0000 UTC",
                "2024-01-01 02:00:00 +0000 UTC",
                "2024-01-01 03:00:00 +0000 UTC",
                "2024-01-01 04:00:00 +0000 UTC",
            ]
        );
        for chunk in rows.chunks(nodes) {
            assert!(chunk.iter().all(|r| text(r, "interval_start") == text(&chunk[0], "interval_start")));
            let names: Vec<&str> = chunk.iter().map(|r| text(r, "node")).collect();
            let expected: Vec<&str> = topology.nodes.iter().map(|n| n.name.as_str()).collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn test_custom_interval_width() {
        let topology = build(&GeneratorConfig { max_nodes: 1, ..Default::default() }, 3);
        let window = ReportWindow::parse("2024-01-01", "2024-01-03").unwrap();
        let emitter = ReportEmitter::new(&topology, window).with_interval_width(Duration::days(1));
        assert_eq!(emitter.interval_count(), 2);

        let mut rng = StdRng::seed_from_u64(3);
        let rows: Vec<_> = emitter.rows(&mut rng, &[ReportKind::NodeLabel]).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(text(&rows[1], "interval_start"), "2024-01-02 00:00:00 +0000 UTC");
    }

    #[test]
    fn test_every_row_has_exactly_its_columns() {
        let topology = build(&GeneratorConfig::default(), 31);
        let rows = emit(&topology, "2024-01-31T22:00:00Z", "2024-02-01T02:00:00Z", &ReportKind::ALL, 31);

        for kind in ReportKind::ALL {
            assert!(rows.iter().any(|r| r.kind() == kind) || kind == ReportKind::StorageUsage);
        }
        for row in &rows {
            let json = serde_json::to_value(row).unwrap();
            let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
            keys.sort_unstable();
            let mut expected: Vec<&str> = row.columns().to_vec();
            expected.sort_unstable();
            assert_eq!(keys, expected, "{}", row.kind());
            assert!(row.iter().all(|(_, cell)| !cell.is_empty()), "{:?}", row);
        }
    }

    #[test]
    fn test_sampled_usage_respects_limits() {
        for seed in 0..10 {
            let topology = build(&GeneratorConfig::default(), seed);
            let rows = emit(
                &topology,
                "2024-01-01",
                "2024-01-01T06:00:00Z",
                &[ReportKind::PodUsage, ReportKind::StorageUsage],
                seed,
            );

            for row in &rows {
                match row.kind() {
                    ReportKind::PodUsage => {
                        let usage = num(row, "pod_usage_cpu_core_seconds");
                        let limit = num(row, "pod_limit_cpu_core_seconds");
                        let request = num(row, "pod_request_cpu_core_seconds");
                        let capacity = num(row, "node_capacity_cpu_core_seconds");
                        assert!(usage <= limit && limit <= request && request <= capacity);

                        let usage = num(row, "pod_usage_memory_byte_seconds");
                        let limit = num(row, "pod_limit_memory_byte_seconds");
                        let request = num(row, "pod_request_memory_byte_seconds");
                        let capacity = num(row, "node_capacity_memory_byte_seconds");
                        assert!(usage <= limit && limit <= request && request <= capacity);
                    }
                    ReportKind::StorageUsage => {
                        let usage = num(row, "persistentvolumeclaim_usage_byte_seconds");
                        let capacity = num(row, "persistentvolumeclaim_capacity_byte_seconds");
                        let request = num(row, "volume_request_storage_byte_seconds");
                        assert!(usage <= capacity && capacity <= request);
                    }
                    _ => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn test_dated_usage_override_matches_calendar_date() {
        let topology = build(&pinned_config(), 0);
        // 2024-01-03 has no override and falls back to sampling.
        let rows = emit(
            &topology,
            "2024-01-01T23:00:00Z",
            "2024-01-03T01:00:00Z",
            &[ReportKind::PodUsage, ReportKind::StorageUsage],
            0,
        );
        assert_eq!(rows.len(), 26 * 2);

        for row in rows.iter().filter(|r| r.kind() == ReportKind::PodUsage) {
            let cpu = num(row, "pod_usage_cpu_core_seconds");
            let mem = num(row, "pod_usage_memory_byte_seconds");
            match &text(row, "interval_start")[..10] {
                "2024-01-01" => {
                    assert_eq!(cpu, 0.5 * 3600.0);
                    assert_eq!(mem, 1.0 * GIB_BYTES as f64 * 3600.0);
                }
                "2024-01-02" => {
                    assert_eq!(cpu, 0.75 * 3600.0);
                    assert_eq!(mem, 1.5 * GIB_BYTES as f64 * 3600.0);
                }
                _ => {
                    assert!(cpu <= num(row, "pod_limit_cpu_core_seconds"));
                    assert!(mem <= num(row, "pod_limit_memory_byte_seconds"));
                }
            }
        }
        for row in rows.iter().filter(|r| r.kind() == ReportKind::StorageUsage) {
            let used = num(row, "persistentvolumeclaim_usage_byte_seconds");
            if text(row, "interval_start").starts_with("2024-01-02") {
                assert_eq!(used, 4.0 * GIB_BYTES as f64 * 3600.0);
            }
            assert_eq!(text(row, "pod"), "pod-pinned");
            assert_eq!(text(row, "storageclass"), "gp2");
        }
    }

    #[test]
    fn test_full_override_is_deterministic() {
        let config = pinned_config();
        let render = |seed: u64| {
            let topology = build(&config, seed);
            let rows = emit(&topology, "2024-01-01", "2024-01-03", &ReportKind::ALL, seed + 100);
            serde_json::to_string(&rows).unwrap()
        };
        assert_eq!(render(1), render(2));
    }

    #[test]
    fn test_pod_seconds_clamped_to_interval() {
        let mut config = pinned_config();
        let pods = config.nodes.as_mut().unwrap()[0]
            .namespaces
            .as_mut()
            .unwrap()
            .get_mut("pinned-ns")
            .unwrap()
            .pods
            .as_mut()
            .unwrap();
        pods[0].pod_seconds = Some(5000);
        pods.push(PodAttributes {
            pod_name: Some("pod-half".into()),
            cpu_request: Some(1.0),
            pod_seconds: Some(1800),
            ..Default::default()
        });

        let topology = build(&config, 0);
        let rows = emit(&topology, "2024-01-01", "2024-01-01T01:00:00Z", &[ReportKind::PodUsage], 0);
        assert_eq!(rows.len(), 2);
        assert_eq!(num(&rows[0], "pod_request_cpu_core_seconds"), 2.0 * 3600.0);
        assert_eq!(num(&rows[1], "pod_request_cpu_core_seconds"), 1.0 * 1800.0);
        assert_eq!(num(&rows[1], "node_capacity_cpu_core_seconds"), 4.0 * 3600.0);
    }

    #[test]
    fn test_row_stream_is_restartable_from_emitter() {
        let topology = build(&GeneratorConfig::default(), 8);
        let window = ReportWindow::parse("2024-01-01", "2024-01-01T03:00:00Z").unwrap();
        let emitter = ReportEmitter::new(&topology, window);
        let mut rng = StdRng::seed_from_u64(8);

        let mut stream = emitter.rows(&mut rng, &[ReportKind::NamespaceLabel]);
        let first = stream.next().unwrap();
        let rest = stream.count();
        let again = emitter.rows(&mut StdRng::seed_from_u64(8), &[ReportKind::NamespaceLabel]).count();

        assert_eq!(rest + 1, again);
        assert_eq!(again, 3 * topology.summary().namespaces);
        assert_eq!(text(&first, "interval_start"), "2024-01-01 00:00:00 +0000 UTC");
    }

    #[test]
    fn test_fractional_node_memory_bounds_pod_request() {
        let namespace = NamespaceAttributes {
            pods: Some(vec![PodAttributes {
                pod_name: Some("pod-oversized".into()),
                mem_request_gig: Some(1.0),
                pod_seconds: Some(HOUR_SECONDS),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let config = GeneratorConfig {
            max_node_namespace_volumes: 0,
            nodes: Some(vec![NodeAttributes {
                node_name: Some("node-tiny".into()),
                cpu_cores: Some(1),
                memory_gig: Some(0.1),
                namespaces: Some(BTreeMap::from([("tiny-ns".to_string(), namespace)])),
                ..Default::default()
            }]),
            ..Default::default()
        };

        for seed in 0..5 {
            let topology = build(&config, seed);
            let rows = emit(&topology, "2024-01-01", "2024-01-01T01:00:00Z", &[ReportKind::PodUsage], seed);
            assert_eq!(rows.len(), 1);

            let row = &rows[0];
            let usage = num(row, "pod_usage_memory_byte_seconds");
            let limit = num(row, "pod_limit_memory_byte_seconds");
            let request = num(row, "pod_request_memory_byte_seconds");
            let capacity = num(row, "node_capacity_memory_byte_seconds");
            assert_eq!(request, capacity, "request clamps to the whole-byte node capacity");
            assert!(usage <= limit && limit <= request);
        }
    }
}
