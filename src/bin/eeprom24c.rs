#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate eeprom_24cxx;
use eeprom_24cxx::*;

use std::fs;
use std::io::{
	self,
	Write,
};
use std::process::exit;

use eeprom_24cxx::clock::Clock;
use eeprom_24cxx::eeprom;
use eeprom_24cxx::i2c::{
	self,
	I2cBus,
	mock::SimulatedEeprom,
};

const DEFAULT_BUS: &str = "1";
const DEFAULT_ADDRESS: u32 = 0x50;
const DEFAULT_TEST_VALUE: u32 = 0x55;

// decimal or 0x-prefixed hex
fn parse_number(s: &str) -> AResult<u32> {
	let parsed = if s.starts_with("0x") || s.starts_with("0X") {
		u32::from_str_radix(&s[2..], 16)
	} else {
		s.parse::<u32>()
	};
	parsed.map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid number {:?}: {}", s, e);
		e.context(msg).into()
	})
}

fn get_number(matches: &clap::ArgMatches, name: &str, max: u32) -> AResult<Option<u32>> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => return Ok(None),
	};
	let value = parse_number(param)?;
	ensure!(value <= max, "invalid parameter {}: {} (must be at most 0x{:x})", name, param, max);
	Ok(Some(value))
}

fn get_address(matches: &clap::ArgMatches) -> AResult<u16> {
	match get_number(matches, "ADDRESS", 0xffff)? {
		Some(address) => Ok(address as u16),
		None => bail!("missing parameter ADDRESS"),
	}
}

fn hexdump(base: usize, data: &[u8]) {
	for i in 0..data.len() {
		if 0 == i % 16 {
			print!("{:08x} ", base + i);
		} else if 0 == i % 8 {
			print!(" ");
		}
		print!(" {:02x}", data[i]);
		if 15 == i % 16 {
			println!("");
		}
	}
	if 0 != data.len() % 16 {
		println!("");
	}
}

fn info<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>) -> AResult<()> {
	let ready = eeprom.is_ready();
	println!("Type:          {}", eeprom.variant());
	println!("I2C address:   0x{:02x}", eeprom.i2c_address());
	println!("Size:          {} bytes", eeprom.size());
	println!("Page size:     {} bytes", eeprom.page_size());
	println!("Address bytes: {}", eeprom.address_width().bytes());
	println!("Responding:    {}", if ready { "yes" } else { "no" });
	Ok(())
}

fn read<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m)?;
	let length = get_number(sub_m, "LENGTH", 0xffff)?.unwrap_or(1) as usize;

	if length == 1 {
		let data = eeprom.read_byte(address)?;
		hexdump(address as usize, &[data]);
	} else {
		let data = eeprom::read_image(eeprom, address, length)?;
		hexdump(address as usize, &data);
	}
	Ok(())
}

fn write<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m)?;
	let mut data = Vec::new();
	for byte in sub_m.values_of("BYTES").into_iter().flatten() {
		let value = parse_number(byte)?;
		ensure!(value <= 0xff, "invalid byte value: {}", byte);
		data.push(value as u8);
	}

	match data.len() {
		0 => bail!("nothing to write"),
		1 => eeprom.write_byte(address, data[0])?,
		_ => eeprom.write_bytes(address, &data)?,
	}
	info!("Wrote {} byte(s) at 0x{:04x}", data.len(), address);
	Ok(())
}

fn dump<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>) -> AResult<()> {
	let size = eeprom.size();
	let image = eeprom::read_image(eeprom, 0, size)?;
	io::stdout().write_all(&image)?;
	Ok(())
}

fn flash<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let file = match sub_m.value_of("FILE") {
		Some(f) => f,
		None => bail!("missing parameter FILE"),
	};
	let offset = get_number(sub_m, "offset", 0xffff)?.unwrap_or(0) as u16;

	let image = fs::read(file).map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("couldn't read image {}: {}", file, e);
		failure::Error::from(e.context(msg))
	})?;

	eeprom::write_image(eeprom, offset, &image)
}

fn test<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>, sub_m: &clap::ArgMatches) -> AResult<()> {
	eeprom::test_device(eeprom)?;
	info!("{} at 0x{:02x} is responding", eeprom.variant(), eeprom.i2c_address());

	let address = get_number(sub_m, "ADDRESS", 0xffff)?.unwrap_or(0) as u16;
	let value = get_number(sub_m, "VALUE", 0xff)?.unwrap_or(DEFAULT_TEST_VALUE) as u8;
	eeprom::test_read_write(eeprom, address, value)?;
	info!("Read/write test at 0x{:04x} passed", address);
	Ok(())
}

fn run<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>, matches: &clap::ArgMatches) -> AResult<()> {
	match matches.subcommand() {
		("info", _) => {
			info(eeprom)
		},
		("read", Some(sub_m)) => {
			read(eeprom, sub_m)
		},
		("write", Some(sub_m)) => {
			write(eeprom, sub_m)
		},
		("dump", _) => {
			dump(eeprom)
		},
		("flash", Some(sub_m)) => {
			flash(eeprom, sub_m)
		},
		("test", Some(sub_m)) => {
			test(eeprom, sub_m)
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg bus: -b --bus +takes_value "I2C bus number or i2c-dev path (default: 1)")
		(@arg eeprom_type: -t --type +takes_value +required "EEPROM type (24C01 .. 24C256)")
		(@arg address: -a --address +takes_value "7-bit I2C address (default: 0x50)")
		(@arg simulate: --simulate "use a simulated device instead of real hardware")
		(@subcommand info =>
			(about: "show device geometry and whether it responds")
		)
		(@subcommand read =>
			(about: "read bytes and print a hexdump")
			(@arg ADDRESS: +required "start address")
			(@arg LENGTH: "number of bytes (default: 1)")
		)
		(@subcommand write =>
			(about: "write bytes")
			(@arg ADDRESS: +required "start address")
			(@arg BYTES: +required +multiple "byte values")
		)
		(@subcommand dump =>
			(about: "dump whole EEPROM as binary to stdout")
		)
		(@subcommand flash =>
			(about: "write image file and verify it")
			(@arg offset: -o --offset +takes_value "start address (default: 0)")
			(@arg FILE: +required "image file")
		)
		(@subcommand test =>
			(about: "check device responds and run a read/write test (original content is restored)")
			(@arg ADDRESS: "address to test (default: 0)")
			(@arg VALUE: "test value (default: 0x55)")
		)
	).get_matches();

	let variant: DeviceVariant = match matches.value_of("eeprom_type") {
		Some(t) => t.parse()?,
		None => bail!("missing parameter --type"),
	};
	let address = get_number(&matches, "address", 0x7f)?.unwrap_or(DEFAULT_ADDRESS) as u8;

	if matches.is_present("simulate") {
		let bus = SimulatedEeprom::for_variant(variant, address);
		let mut eeprom = Eeprom::init(bus, variant, address)?;
		run(&mut eeprom, &matches)
	} else {
		let bus_name = matches.value_of("bus").unwrap_or(DEFAULT_BUS);
		let bus = i2c::open_bus(bus_name).map_err(|e| {
			let e = failure::Error::from(e);
			let msg = format!("couldn't open I2C bus {}: {}", i2c::bus_path(bus_name), e);
			failure::Error::from(e.context(msg))
		})?;
		let mut eeprom = Eeprom::init(bus, variant, address)?;
		run(&mut eeprom, &matches)
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
