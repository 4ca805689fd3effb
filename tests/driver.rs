use std::time::Duration;

use eeprom_24cxx::clock::ManualClock;
use eeprom_24cxx::i2c::mock::{
	Event,
	SimulatedEeprom,
};
use eeprom_24cxx::i2c::{
	AddressWidth,
	Direction,
};
use eeprom_24cxx::{
	DeviceVariant,
	Eeprom,
	EepromError,
	ErrorKind,
	ReadyPoll,
};

fn setup(variant: DeviceVariant) -> Eeprom<SimulatedEeprom, ManualClock> {
	let bus = SimulatedEeprom::for_variant(variant, 0x50);
	let mut eeprom = Eeprom::with_clock(bus, ManualClock::new(), variant, 0x50).unwrap();
	eeprom.bus_mut().clear_events();
	eeprom
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Kind {
	Read,
	Write,
	Start,
	Stop,
}

fn kinds(events: &[Event]) -> Vec<Kind> {
	events.iter().filter_map(|e| match e {
		Event::Read { .. } => Some(Kind::Read),
		Event::Write { .. } => Some(Kind::Write),
		Event::Start { .. } => Some(Kind::Start),
		Event::Stop => Some(Kind::Stop),
		Event::Init => None,
	}).collect()
}

// (device address, memory address, length) of every write transfer
fn writes(events: &[Event]) -> Vec<(u8, u16, usize)> {
	events.iter().filter_map(|e| match e {
		Event::Write { device_address, memory_address, data, .. } => Some((*device_address, *memory_address, data.len())),
		_ => None,
	}).collect()
}

#[test]
fn init_reproduces_variant_table() {
	let table = [
		(DeviceVariant::Eeprom24C01, 128, 8, 1),
		(DeviceVariant::Eeprom24C02, 256, 8, 1),
		(DeviceVariant::Eeprom24C04, 512, 16, 1),
		(DeviceVariant::Eeprom24C08, 1024, 16, 1),
		(DeviceVariant::Eeprom24C16, 2048, 16, 1),
		(DeviceVariant::Eeprom24C32, 4096, 32, 2),
		(DeviceVariant::Eeprom24C64, 8192, 32, 2),
		(DeviceVariant::Eeprom24C128, 16384, 64, 2),
		(DeviceVariant::Eeprom24C256, 32768, 64, 2),
	];
	for &(variant, size, page_size, address_bytes) in table.iter() {
		let eeprom = Eeprom::init(SimulatedEeprom::for_variant(variant, 0x50), variant, 0x50).unwrap();
		assert_eq!(eeprom.size(), size, "{}", variant);
		assert_eq!(eeprom.page_size(), page_size, "{}", variant);
		assert_eq!(eeprom.address_width().bytes(), address_bytes, "{}", variant);
		assert_eq!(eeprom.variant(), variant);
		assert_eq!(eeprom.bus().events(), &[Event::Init]);
	}
}

#[test]
fn reinit_replaces_configuration() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C02);
	eeprom.reinit(DeviceVariant::Eeprom24C256, 0x51).unwrap();
	assert_eq!(eeprom.size(), 32768);
	assert_eq!(eeprom.page_size(), 64);
	assert_eq!(eeprom.address_width(), AddressWidth::Two);
	assert_eq!(eeprom.i2c_address(), 0x51);
	assert_eq!(eeprom.bus().events(), &[Event::Init]);
}

#[test]
fn out_of_range_address_touches_no_bus() {
	for variant in DeviceVariant::ALL.iter().cloned() {
		let mut eeprom = setup(variant);
		let size = variant.size();
		for &address in [size, size + 1, 0xffff].iter() {
			let address = address as u16;
			let err = eeprom.read_byte(address).unwrap_err();
			assert_eq!(err.kind(), ErrorKind::Address);
			let err = eeprom.write_byte(address, 0xab).unwrap_err();
			assert_eq!(err.kind(), ErrorKind::Address);
		}
		assert!(eeprom.bus().events().is_empty(), "{}", variant);
	}
}

#[test]
fn byte_access_is_a_single_transfer() {
	for variant in DeviceVariant::ALL.iter().cloned() {
		let mut eeprom = setup(variant);
		let width = variant.address_width();
		let last = (variant.size() - 1) as u16;

		eeprom.read_byte(last).unwrap();
		match eeprom.bus().transfers().as_slice() {
			[Event::Read { address_width, len, .. }] => {
				assert_eq!(*address_width, width);
				assert_eq!(*len, 1);
			},
			other => panic!("{}: unexpected transfers {:?}", variant, other),
		}

		eeprom.bus_mut().clear_events();
		eeprom.write_byte(last, 0x42).unwrap();
		match eeprom.bus().transfers().as_slice() {
			[Event::Write { address_width, data, .. }] => {
				assert_eq!(*address_width, width);
				assert_eq!(data, &vec![0x42]);
			},
			other => panic!("{}: unexpected transfers {:?}", variant, other),
		}
		assert_eq!(eeprom.bus().memory()[last as usize], 0x42);
	}
}

#[test]
fn short_read_is_i2c_error() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C02);
	eeprom.bus_mut().fail_next_transfer(0);
	match eeprom.read_byte(3) {
		Err(EepromError::I2c { expected: 1, transferred: 0 }) => (),
		other => panic!("unexpected result {:?}", other),
	}
}

#[test]
fn failed_write_skips_ready_poll() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C32);
	eeprom.bus_mut().fail_next_transfer(0);
	let err = eeprom.write_byte(10, 0xab).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::I2c);
	assert_eq!(err.kind().code(), 0x10);
	assert_eq!(eeprom.bus().probes(), 0);
	assert_eq!(kinds(eeprom.bus().events()), vec![Kind::Write]);
}

#[test]
fn write_waits_for_write_cycle() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C64);
	eeprom.bus_mut().set_write_cycle(4);
	eeprom.write_byte(0x100, 0x5a).unwrap();

	// four NACKed probes, the fifth one answers
	assert_eq!(eeprom.bus().probes(), 5);
	assert_eq!(eeprom.clock().elapsed(), eeprom.ready_poll().interval * 4);
	assert_eq!(eeprom.read_byte(0x100).unwrap(), 0x5a);
}

#[test]
fn wait_ready_gives_up_after_100_polls() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C02);
	eeprom.bus_mut().set_always_busy(true);

	match eeprom.wait_ready() {
		Err(EepromError::NotReady { attempts: 100 }) => (),
		other => panic!("unexpected result {:?}", other),
	}
	assert_eq!(eeprom.bus().probes(), 100);
	assert!(eeprom.clock().elapsed() <= eeprom.ready_poll().timeout);
}

#[test]
fn wait_ready_respects_timeout() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C02);
	eeprom.bus_mut().set_always_busy(true);
	eeprom.set_ready_poll(ReadyPoll {
		max_attempts: 1000,
		interval: Duration::from_millis(1),
		timeout: Duration::from_millis(10),
	});

	match eeprom.wait_ready() {
		Err(EepromError::NotReady { attempts: 11 }) => (),
		other => panic!("unexpected result {:?}", other),
	}
	assert_eq!(eeprom.clock().elapsed(), Duration::from_millis(10));
}

#[test]
fn wait_ready_on_idle_device() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C02);
	assert_eq!(eeprom.wait_ready().unwrap(), 1);
	assert_eq!(eeprom.clock().elapsed(), Duration::from_secs(0));
}

#[test]
fn write_reports_unfinished_write_cycle() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C08);
	eeprom.bus_mut().set_write_cycle(1000);
	let err = eeprom.write_byte(0x3ff, 0x01).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotReady);
	assert_eq!(err.kind().code(), 0x14);
	// the byte went out, only the commit wasn't confirmed
	assert_eq!(eeprom.bus().memory()[0x3ff], 0x01);
}

#[test]
fn is_ready_probes_device_address() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C16);
	assert!(eeprom.is_ready());
	assert_eq!(eeprom.bus().events(), &[
		Event::Start { device_address: 0x50, direction: Direction::Write },
		Event::Stop,
	]);

	let bus = SimulatedEeprom::for_variant(DeviceVariant::Eeprom24C16, 0x50);
	let mut absent = Eeprom::with_clock(bus, ManualClock::new(), DeviceVariant::Eeprom24C16, 0x58).unwrap();
	assert!(!absent.is_ready());
}

#[test]
fn round_trip() {
	for variant in DeviceVariant::ALL.iter().cloned() {
		let mut eeprom = setup(variant);
		let size = variant.size();
		let addresses = [0u16, 1, (size / 3) as u16, (size / 2) as u16, (size - 1) as u16];
		for (i, &address) in addresses.iter().enumerate() {
			let value = 0x10 + i as u8;
			eeprom.write_byte(address, value).unwrap();
			assert_eq!(eeprom.read_byte(address).unwrap(), value, "{} @ 0x{:04x}", variant, address);
		}
	}
}

#[test]
fn scenario_24c32() {
	let bus = SimulatedEeprom::for_variant(DeviceVariant::Eeprom24C32, 0x50);
	let mut eeprom = Eeprom::init(bus, DeviceVariant::Eeprom24C32, 0x50).unwrap();
	assert_eq!(eeprom.size(), 4096);
	assert_eq!(eeprom.page_size(), 32);
	assert_eq!(eeprom.address_width(), AddressWidth::Two);

	match eeprom.write_byte(5000, 0xab) {
		Err(EepromError::Address { address: 5000, size: 4096 }) => (),
		other => panic!("unexpected result {:?}", other),
	}
	eeprom.write_byte(10, 0xab).unwrap();
	assert_eq!(eeprom.read_byte(10).unwrap(), 0xab);
}

#[test]
fn write_bytes_splits_at_page_boundaries() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C02);
	eeprom.bus_mut().set_write_cycle(2);
	let data: Vec<u8> = (0..20).collect();
	eeprom.write_bytes(5, &data).unwrap();

	assert_eq!(writes(eeprom.bus().events()), vec![
		(0x50, 5, 3),
		(0x50, 8, 8),
		(0x50, 16, 8),
		(0x50, 24, 1),
	]);

	// every page write is followed by polling until the device answers
	let mut expected = Vec::new();
	for _ in 0..4 {
		expected.push(Kind::Write);
		for _ in 0..3 {
			expected.push(Kind::Start);
			expected.push(Kind::Stop);
		}
	}
	assert_eq!(kinds(eeprom.bus().events()), expected);

	assert_eq!(&eeprom.bus().memory()[5..25], &data[..]);
	assert_eq!(eeprom.bus().memory()[4], 0xff);
	assert_eq!(eeprom.bus().memory()[25], 0xff);
}

#[test]
fn write_bytes_aligned_full_pages() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C256);
	let data = vec![0xa5u8; 128];
	eeprom.write_bytes(0x7f80, &data).unwrap();
	assert_eq!(writes(eeprom.bus().events()), vec![
		(0x50, 0x7f80, 64),
		(0x50, 0x7fc0, 64),
	]);
	assert!(eeprom.bus().memory()[0x7f80..].iter().all(|&b| b == 0xa5));
}

#[test]
fn write_bytes_crosses_block_select() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C16);
	let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
	eeprom.write_bytes(0xfc, &data).unwrap();
	assert_eq!(writes(eeprom.bus().events()), vec![
		(0x50, 0xfc, 4),
		(0x51, 0x00, 4),
	]);
	assert_eq!(&eeprom.bus().memory()[0xfc..0x104], &data);

	let mut back = [0u8; 8];
	eeprom.read_bytes(0xfc, &mut back).unwrap();
	assert_eq!(back, data);
}

#[test]
fn write_bytes_checks_range_before_writing() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C01);
	let err = eeprom.write_bytes(120, &[0u8; 9]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Size);
	assert_eq!(err.kind().code(), 0x12);
	let err = eeprom.write_bytes(128, &[0u8; 1]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Address);
	assert!(eeprom.bus().events().is_empty());

	eeprom.write_bytes(120, &[0u8; 8]).unwrap();
	eeprom.write_bytes(0, &[]).unwrap();
	assert_eq!(writes(eeprom.bus().events()), vec![(0x50, 120, 8)]);
}

#[test]
fn write_bytes_stops_at_first_failure() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C02);
	eeprom.bus_mut().set_write_cycle(1000);
	let err = eeprom.write_bytes(0, &[0u8; 16]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotReady);
	assert_eq!(writes(eeprom.bus().events()).len(), 1);
}

#[test]
fn write_page_limits() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C32);

	match eeprom.write_page(30, &[0u8; 4]) {
		Err(EepromError::PageSize { address: 30, length: 4, page_size: 32 }) => (),
		other => panic!("unexpected result {:?}", other),
	}
	let err = eeprom.write_page(0, &[0u8; 33]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PageSize);
	assert_eq!(err.kind().code(), 0x13);
	let err = eeprom.write_page(4096, &[0u8; 1]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Address);
	eeprom.write_page(64, &[]).unwrap();
	assert!(eeprom.bus().events().is_empty());

	eeprom.write_page(32, &[7u8; 32]).unwrap();
	assert_eq!(writes(eeprom.bus().events()), vec![(0x50, 32, 32)]);
	assert!(eeprom.bus().probes() >= 1);
	assert!(eeprom.bus().memory()[32..64].iter().all(|&b| b == 7));
}

#[test]
fn read_bytes_is_one_transfer() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C256);
	for (i, b) in eeprom.bus_mut().memory_mut().iter_mut().enumerate() {
		*b = i as u8;
	}

	let mut buffer = vec![0u8; 32768];
	eeprom.read_bytes(0, &mut buffer).unwrap();
	assert_eq!(eeprom.bus().transfers().len(), 1);
	assert_eq!(&buffer[..], eeprom.bus().memory());
}

#[test]
fn read_bytes_limits() {
	let mut eeprom = setup(DeviceVariant::Eeprom24C01);
	let mut buffer = [0u8; 9];

	eeprom.read_bytes(120, &mut buffer[..8]).unwrap();
	match eeprom.read_bytes(120, &mut buffer) {
		Err(EepromError::Size { address: 120, length: 9, size: 128 }) => (),
		other => panic!("unexpected result {:?}", other),
	}
	let err = eeprom.read_bytes(128, &mut buffer[..1]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Address);
	eeprom.read_bytes(0, &mut buffer[..0]).unwrap();
	assert_eq!(eeprom.bus().transfers().len(), 1);

	eeprom.bus_mut().fail_next_transfer(3);
	match eeprom.read_bytes(0, &mut buffer) {
		Err(EepromError::I2c { expected: 9, transferred: 3 }) => (),
		other => panic!("unexpected result {:?}", other),
	}
}

#[test]
fn drivers_are_independent() {
	let mut first = SimulatedEeprom::for_variant(DeviceVariant::Eeprom24C02, 0x50);
	let mut second = SimulatedEeprom::for_variant(DeviceVariant::Eeprom24C256, 0x57);
	{
		let mut a = Eeprom::with_clock(&mut first, ManualClock::new(), DeviceVariant::Eeprom24C02, 0x50).unwrap();
		let mut b = Eeprom::with_clock(&mut second, ManualClock::new(), DeviceVariant::Eeprom24C256, 0x57).unwrap();
		a.write_byte(0x10, 1).unwrap();
		b.write_byte(0x1000, 2).unwrap();
		assert_eq!(a.size(), 256);
		assert_eq!(b.size(), 32768);
	}
	assert_eq!(first.memory()[0x10], 1);
	assert_eq!(second.memory()[0x1000], 2);
}
