use crate::builders::{SdtBuilder, ServiceBuilder};
use crate::descriptor::{Descriptor, DescriptorTag};
use crate::flags::RunningStatus;
use crate::sdt::{Sdt, SdtScope, Service};
use crate::section::{MAX_LONG_SECTION_PAYLOAD, Section};

/// Payload bytes at the start of every section: onid plus a reserved byte.
const PAYLOAD_HEADER: usize = 3;

/// Fixed per-service bytes: id, flags byte, status/loop-length pair.
const SERVICE_HEADER: usize = 5;

fn service_with_descriptors(count: usize, payload_len: usize) -> Service {
    let mut service = Service::default();
    for i in 0..count {
        service
            .descriptors
            .push(Descriptor::new(0x90u8, vec![i as u8; payload_len]).unwrap());
    }
    service
}

fn raw_section(table_id: u8, payload: Vec<u8>) -> Section {
    Section {
        table_id,
        table_id_extension: 0x0007,
        version: 1,
        is_current: true,
        section_number: 0,
        last_section_number: 0,
        payload,
    }
}

#[test]
fn test_round_trip_single_section() {
    let sdt = SdtBuilder::new(SdtScope::Actual)
        .version(12)
        .current(true)
        .transport_stream_id(0x0044)
        .original_network_id(0x1001)
        .service(
            0x0101,
            ServiceBuilder::new()
                .service_type(0x01)
                .provider("ACME")
                .name("Sports")
                .running_status(RunningStatus::Running)
                .eit_present_following(true)
                .build()
                .unwrap(),
        )
        .service(
            0x0102,
            ServiceBuilder::new()
                .service_type(0x02)
                .name("Radio One")
                .free_ca_mode(true)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let sections = sdt.to_sections().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].table_id, 0x42);
    assert_eq!(sections[0].table_id_extension, 0x0044);

    let decoded = Sdt::from_sections(&sections);
    assert!(decoded.is_valid());
    assert_eq!(decoded, sdt);
}

#[test]
fn test_round_trip_through_wire_bytes() {
    let mut sdt = Sdt::new(SdtScope::Other, 7, false, 0x0100, 0x2000);
    sdt.service_entry(0x0001).set_name("One", 0x01).unwrap();
    sdt.service_entry(0x0002).set_name("Two", 0x01).unwrap();

    let mut stream = Vec::new();
    for section in sdt.to_sections().unwrap() {
        stream.extend_from_slice(&section.encode_to_vec());
    }

    let mut sections = Vec::new();
    let mut rest = &stream[..];
    while !rest.is_empty() {
        let (section, consumed) = Section::parse(rest).unwrap();
        sections.push(section);
        rest = &rest[consumed..];
    }

    let decoded = Sdt::from_sections(&sections);
    assert_eq!(decoded, sdt);
}

#[test]
fn test_empty_table_yields_one_header_only_section() {
    let sdt = Sdt::new(SdtScope::Actual, 0, true, 0x0010, 0xABCD);
    let sections = sdt.to_sections().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].payload, vec![0xAB, 0xCD, 0xFF]);
    assert_eq!(sections[0].section_number, 0);
    assert_eq!(sections[0].last_section_number, 0);

    let decoded = Sdt::from_sections(&sections);
    assert!(decoded.is_valid());
    assert!(decoded.services.is_empty());
    assert_eq!(decoded.original_network_id, 0xABCD);
}

#[test]
fn test_section_count_stays_within_bound() {
    let mut sdt = Sdt::new(SdtScope::Actual, 0, true, 1, 2);
    let count = 500usize;
    for id in 0..count as u16 {
        sdt.services.insert(id, Service::default());
    }

    let sections = sdt.to_sections().unwrap();
    let bound = (count * SERVICE_HEADER + PAYLOAD_HEADER).div_ceil(MAX_LONG_SECTION_PAYLOAD);
    assert!(!sections.is_empty());
    assert!(
        sections.len() <= bound,
        "{} sections exceed the bound of {bound}",
        sections.len()
    );
    for section in &sections {
        assert!(section.payload.len() <= MAX_LONG_SECTION_PAYLOAD);
    }

    let decoded = Sdt::from_sections(&sections);
    assert_eq!(decoded.services.len(), count);
}

#[test]
fn test_section_numbers_ascend_and_share_the_last() {
    let mut sdt = Sdt::new(SdtScope::Actual, 9, true, 3, 4);
    for id in 0..600u16 {
        sdt.services.insert(id, Service::default());
    }

    let sections = sdt.to_sections().unwrap();
    assert!(sections.len() > 1);
    let last = (sections.len() - 1) as u8;
    for (i, section) in sections.iter().enumerate() {
        assert_eq!(section.section_number, i as u8);
        assert_eq!(section.last_section_number, last);
        assert_eq!(section.version, 9);
        assert_eq!(section.table_id_extension, 3);
        // Every section repeats the constant payload header.
        assert_eq!(&section.payload[..3], &[0x00, 0x04, 0xFF]);
        assert!(section.is_well_formed());
    }
}

#[test]
fn test_oversized_descriptor_loop_spans_sections() {
    // 20 descriptors of 102 encoded bytes each: 2040 bytes of loop for a
    // 1012-byte section budget.
    let service = service_with_descriptors(20, 100);
    let original = service.descriptors.clone();

    let mut sdt = Sdt::new(SdtScope::Actual, 1, true, 1, 2);
    sdt.services.insert(0x0500, service);

    let sections = sdt.to_sections().unwrap();
    assert!(sections.len() >= 2, "loop must span sections");
    for section in &sections {
        assert!(section.payload.len() <= MAX_LONG_SECTION_PAYLOAD);
        // The continuation repeats the service header, so every section
        // opens with the same service id after the payload header.
        assert_eq!(&section.payload[3..5], &[0x05, 0x00]);
    }

    let decoded = Sdt::from_sections(&sections);
    assert!(decoded.is_valid());
    let merged = &decoded.services[&0x0500].descriptors;
    assert_eq!(merged.len(), original.len());
    assert_eq!(merged, &original);
}

#[test]
fn test_split_service_keeps_flags_on_every_header() {
    let mut service = service_with_descriptors(15, 120);
    service.running_status = RunningStatus::Pausing;
    service.free_ca_mode = true;
    service.eit_schedule = true;

    let mut sdt = Sdt::new(SdtScope::Actual, 1, true, 1, 2);
    sdt.services.insert(0x0042, service);

    let sections = sdt.to_sections().unwrap();
    assert!(sections.len() >= 2);

    let decoded = Sdt::from_sections(&sections);
    let service = &decoded.services[&0x0042];
    assert_eq!(service.running_status, RunningStatus::Pausing);
    assert!(service.free_ca_mode);
    assert!(service.eit_schedule);
    assert!(!service.eit_present_following);
}

#[test]
fn test_whole_entry_prefers_a_fresh_section() {
    // First service nearly fills the section; the second fits whole in a
    // fresh one and must not be split.
    let mut sdt = Sdt::new(SdtScope::Actual, 0, true, 1, 2);
    sdt.services.insert(0x0001, service_with_descriptors(4, 248));
    sdt.services.insert(0x0002, service_with_descriptors(2, 100));

    let sections = sdt.to_sections().unwrap();
    assert_eq!(sections.len(), 2);
    // Second section carries the entire second service: header plus loop.
    assert_eq!(
        sections[1].payload.len(),
        PAYLOAD_HEADER + SERVICE_HEADER + 2 * 102
    );

    let decoded = Sdt::from_sections(&sections);
    assert_eq!(decoded.services[&0x0002].descriptors.len(), 2);
}

#[test]
fn test_flag_packing_round_trips_for_every_combination() {
    let mut sdt = Sdt::new(SdtScope::Actual, 0, true, 1, 2);
    let mut id = 0u16;
    for sched in [false, true] {
        for pf in [false, true] {
            for status in 0u8..8 {
                for ca in [false, true] {
                    sdt.services.insert(
                        id,
                        Service {
                            eit_schedule: sched,
                            eit_present_following: pf,
                            running_status: RunningStatus::from(status),
                            free_ca_mode: ca,
                            descriptors: Default::default(),
                        },
                    );
                    id += 1;
                }
            }
        }
    }

    let decoded = Sdt::from_sections(&sdt.to_sections().unwrap());
    assert!(decoded.is_valid());
    assert_eq!(decoded.services, sdt.services);
}

#[test]
fn test_decode_clamps_overlong_loop_length() {
    // Entry declares a 50-byte descriptor loop but only 5 bytes follow.
    let mut payload = vec![0x10, 0x01, 0xFF];
    payload.extend_from_slice(&[0x01, 0x23]); // service id
    payload.push(0xFD); // EIT flags byte
    payload.extend_from_slice(&(0x8000u16 | 50).to_be_bytes());
    payload.extend_from_slice(&[0x48, 3, 0x01, 0x00, 0x00]);

    let decoded = Sdt::from_sections(&[raw_section(0x42, payload)]);
    assert!(decoded.is_valid());
    let service = &decoded.services[&0x0123];
    assert_eq!(service.descriptors.len(), 1);
    assert_eq!(service.descriptors.get(0).unwrap().payload(), &[0x01, 0x00, 0x00]);
    assert_eq!(service.running_status, RunningStatus::Running);
    assert!(!service.free_ca_mode);
}

#[test]
fn test_decode_discards_trailing_padding() {
    let mut payload = vec![0x10, 0x01, 0xFF];
    payload.extend_from_slice(&[0x00, 0x01, 0xFC, 0x00, 0x00]);
    payload.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]); // < 5 bytes of padding

    let decoded = Sdt::from_sections(&[raw_section(0x42, payload)]);
    assert!(decoded.is_valid());
    assert_eq!(decoded.services.len(), 1);
}

#[test]
fn test_decode_rejects_empty_input() {
    let decoded = Sdt::from_sections(&[]);
    assert!(!decoded.is_valid());
    assert!(decoded.services.is_empty());
}

#[test]
fn test_decode_rejects_short_payload() {
    let decoded = Sdt::from_sections(&[raw_section(0x42, vec![0x10, 0x01])]);
    assert!(!decoded.is_valid());
    assert!(decoded.services.is_empty());
    assert_eq!(decoded.original_network_id, 0);
}

#[test]
fn test_decode_rejects_foreign_table_id() {
    let decoded = Sdt::from_sections(&[raw_section(0x4E, vec![0x10, 0x01, 0xFF])]);
    assert!(!decoded.is_valid());
}

#[test]
fn test_decode_rejects_mixed_table_ids() {
    let mut good = vec![0x10, 0x01, 0xFF];
    good.extend_from_slice(&[0x00, 0x01, 0xFC, 0x00, 0x00]);

    let sections = [
        raw_section(0x42, good.clone()),
        raw_section(0x46, good),
    ];
    let decoded = Sdt::from_sections(&sections);
    assert!(!decoded.is_valid());
    // Partial state from the first section must not leak.
    assert!(decoded.services.is_empty());
    assert_eq!(decoded.transport_stream_id, 0);
}

#[test]
fn test_decode_rejects_malformed_section() {
    let mut section = raw_section(0x42, vec![0x10, 0x01, 0xFF]);
    section.section_number = 3; // beyond last_section_number
    let decoded = Sdt::from_sections(&[section]);
    assert!(!decoded.is_valid());
}

#[test]
fn test_conflicting_common_fields_last_section_wins() {
    let mut first = raw_section(0x42, vec![0x10, 0x01, 0xFF]);
    first.last_section_number = 1;
    let mut second = first.clone();
    second.section_number = 1;
    second.version = 4;
    second.table_id_extension = 0x0099;
    second.payload = vec![0x20, 0x02, 0xFF];

    let decoded = Sdt::from_sections(&[first, second]);
    assert!(decoded.is_valid());
    assert_eq!(decoded.version, 4);
    assert_eq!(decoded.transport_stream_id, 0x0099);
    assert_eq!(decoded.original_network_id, 0x2002);
}

#[test]
fn test_repeated_service_id_accumulates_descriptors_in_order() {
    let mut first_payload = vec![0x10, 0x01, 0xFF];
    first_payload.extend_from_slice(&[0x00, 0x07, 0xFC]);
    first_payload.extend_from_slice(&4u16.to_be_bytes());
    first_payload.extend_from_slice(&[0x48, 2, 0xAA, 0xBB]);

    let mut second_payload = vec![0x10, 0x01, 0xFF];
    second_payload.extend_from_slice(&[0x00, 0x07, 0xFC]);
    second_payload.extend_from_slice(&3u16.to_be_bytes());
    second_payload.extend_from_slice(&[0x52, 1, 0xCC]);

    let mut first = raw_section(0x42, first_payload);
    first.last_section_number = 1;
    let mut second = raw_section(0x42, second_payload);
    second.section_number = 1;
    second.last_section_number = 1;

    let decoded = Sdt::from_sections(&[first, second]);
    assert!(decoded.is_valid());
    let descriptors = &decoded.services[&0x0007].descriptors;
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors.get(0).unwrap().tag(), 0x48);
    assert_eq!(descriptors.get(1).unwrap().tag(), 0x52);
}

#[test]
fn test_name_search() {
    let mut sdt = Sdt::new(SdtScope::Actual, 0, true, 1, 2);
    sdt.service_entry(0x0300).set_provider("ACME", 0x01).unwrap();
    sdt.service_entry(0x0300).set_name("Sports", 0x01).unwrap();

    assert_eq!(sdt.find_service("Sports", true), Some(0x0300));
    assert_eq!(sdt.find_service("sports", false), Some(0x0300));
    assert_eq!(sdt.find_service(" S P O R T S ", false), Some(0x0300));

    let empty = Sdt::new(SdtScope::Actual, 0, true, 1, 2);
    assert_eq!(empty.find_service("Sports", true), None);
}

#[test]
fn test_services_survive_round_trip_with_mixed_descriptors() {
    let mut sdt = Sdt::new(SdtScope::Actual, 2, true, 0x0044, 0x1001);
    let entry = sdt.service_entry(0x0A00);
    entry.set_provider("ACME", 0x19).unwrap();
    entry.set_name("Movies HD", 0x19).unwrap();
    entry
        .descriptors
        .push(Descriptor::new(DescriptorTag::CaIdentifier, vec![0x06, 0x02]).unwrap());
    entry.running_status = RunningStatus::StartsShortly;

    let decoded = Sdt::from_sections(&sdt.to_sections().unwrap());
    assert_eq!(decoded, sdt);
    assert_eq!(decoded.services[&0x0A00].service_name(), "Movies HD");
    assert_eq!(decoded.services[&0x0A00].descriptors.len(), 2);
}
