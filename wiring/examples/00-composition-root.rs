use config::{Config, Environment};
use wiring::application::Application;
use wiring::config::{ApplicationConfig, ConfigValues};
use wiring::runner::{ApplicationRunner, ErrorPtr};
use wiring_di::component::Component;
use wiring_di::container::Container;
use wiring_di::error::ProducerError;
use wiring_di::instance::InstancePtr;
use wiring_di::instantiation::Instantiation;
use wiring_di::record::{NameBindings, Params};
use wiring_di::signature::{Arguments, Parameter, Signature};

// application services are used through traits, so implementations can be swapped at the
// composition root only
trait Logger {
    fn describe(&self) -> String;
}

trait CommProtocol {
    fn describe(&self) -> String;
}

trait Communicator {
    fn describe(&self) -> String;
}

trait Database {
    fn describe(&self) -> String;
}

struct FileLogger {
    log_path: InstancePtr<String>,
}

impl Component for FileLogger {
    fn signature() -> Signature {
        // keyword-only parameter, which can be resolved by name, but never by position
        Signature::new().param(Parameter::keyword_only("log_path").typed::<String>())
    }

    fn construct(arguments: Arguments) -> Result<Self, ProducerError> {
        Ok(Self {
            log_path: arguments.get("log_path")?,
        })
    }
}

impl Logger for FileLogger {
    fn describe(&self) -> String {
        format!("FileLogger('{}')", self.log_path)
    }
}

struct UdpCommProtocol {
    logger: InstancePtr<dyn Logger>,
}

impl Component for UdpCommProtocol {
    fn signature() -> Signature {
        Signature::new().param(Parameter::new("logger").typed::<dyn Logger>())
    }

    fn construct(arguments: Arguments) -> Result<Self, ProducerError> {
        Ok(Self {
            logger: arguments.get("logger")?,
        })
    }
}

impl CommProtocol for UdpCommProtocol {
    fn describe(&self) -> String {
        format!("UdpCommProtocol({})", self.logger.describe())
    }
}

struct HttpCommProtocol {
    logger: InstancePtr<dyn Logger>,
    port: InstancePtr<u16>,
}

impl Component for HttpCommProtocol {
    fn signature() -> Signature {
        Signature::new()
            .param(Parameter::new("logger").typed::<dyn Logger>())
            .param(Parameter::new("port").typed::<u16>())
    }

    fn construct(arguments: Arguments) -> Result<Self, ProducerError> {
        Ok(Self {
            logger: arguments.get("logger")?,
            port: arguments.get("port")?,
        })
    }
}

impl CommProtocol for HttpCommProtocol {
    fn describe(&self) -> String {
        format!(
            "HttpCommProtocol({}, {})",
            self.logger.describe(),
            self.port
        )
    }
}

// both communicators share the constructor, only the name differs
struct GenericCommunicator {
    name: &'static str,
    comm_protocol: InstancePtr<dyn CommProtocol>,
    logger: InstancePtr<dyn Logger>,
}

impl GenericCommunicator {
    fn signature() -> Signature {
        Signature::new()
            .param(Parameter::new("comm_protocol").typed::<dyn CommProtocol>())
            .param(Parameter::new("logger").typed::<dyn Logger>())
    }

    fn construct(name: &'static str, arguments: Arguments) -> Result<Self, ProducerError> {
        Ok(Self {
            name,
            comm_protocol: arguments.get("comm_protocol")?,
            logger: arguments.get("logger")?,
        })
    }
}

impl Communicator for GenericCommunicator {
    fn describe(&self) -> String {
        format!(
            "{}({}, {})",
            self.name,
            self.comm_protocol.describe(),
            self.logger.describe()
        )
    }
}

struct SqlDatabase {
    database_url: InstancePtr<String>,
}

impl Component for SqlDatabase {
    fn signature() -> Signature {
        Signature::new().param(Parameter::new("database_url").typed::<String>())
    }

    fn construct(arguments: Arguments) -> Result<Self, ProducerError> {
        Ok(Self {
            database_url: arguments.get("database_url")?,
        })
    }
}

impl Database for SqlDatabase {
    fn describe(&self) -> String {
        format!("SqlDatabase({})", self.database_url)
    }
}

struct NoSqlDatabase {
    database_url: InstancePtr<String>,
    logger: InstancePtr<dyn Logger>,
}

impl Component for NoSqlDatabase {
    fn signature() -> Signature {
        Signature::new()
            .param(Parameter::new("database_url").typed::<String>())
            .param(Parameter::new("logger").typed::<dyn Logger>())
    }

    fn construct(arguments: Arguments) -> Result<Self, ProducerError> {
        Ok(Self {
            database_url: arguments.get("database_url")?,
            logger: arguments.get("logger")?,
        })
    }
}

impl Database for NoSqlDatabase {
    fn describe(&self) -> String {
        format!(
            "NoSqlDatabase({}, {})",
            self.database_url,
            self.logger.describe()
        )
    }
}

struct MainManager {
    logger: InstancePtr<dyn Logger>,
    internal_communicator: InstancePtr<dyn Communicator>,
    external_communicator: InstancePtr<dyn Communicator>,
    database: InstancePtr<dyn Database>,
}

impl MainManager {
    fn work(&self, job_id: &str) {
        println!(
            "Working on job {} with {}, {}, {} and {}",
            job_id,
            self.logger.describe(),
            self.internal_communicator.describe(),
            self.external_communicator.describe(),
            self.database.describe()
        );
    }
}

impl Component for MainManager {
    fn signature() -> Signature {
        // both communicators share a type, so they need explicit name bindings
        Signature::new()
            .param(Parameter::new("logger").typed::<dyn Logger>())
            .param(Parameter::new("internal_communicator").typed::<dyn Communicator>())
            .param(Parameter::new("external_communicator").typed::<dyn Communicator>())
            .param(Parameter::new("database").typed::<dyn Database>())
    }

    fn construct(arguments: Arguments) -> Result<Self, ProducerError> {
        Ok(Self {
            logger: arguments.get("logger")?,
            internal_communicator: arguments.get("internal_communicator")?,
            external_communicator: arguments.get("external_communicator")?,
            database: arguments.get("database")?,
        })
    }
}

// the entry point of the application logic
struct MainRunner {
    main_manager: InstancePtr<MainManager>,
    num_of_jobs: InstancePtr<u32>,
    job_type: InstancePtr<String>,
}

impl ApplicationRunner for MainRunner {
    fn run(&self) -> Result<(), ErrorPtr> {
        for job_index in 0..*self.num_of_jobs {
            self.main_manager
                .work(&format!("{} #{}", self.job_type, job_index));
        }

        Ok(())
    }
}

fn create_base_container(values: &ConfigValues) -> Result<Container, Box<dyn std::error::Error>> {
    let base_container = Container::new("base");
    base_container.register_alias::<FileLogger, dyn Logger>(|logger| logger as InstancePtr<dyn Logger>);
    base_container
        .register_alias::<NoSqlDatabase, dyn Database>(|database| database as InstancePtr<dyn Database>);
    base_container
        .register_alias::<SqlDatabase, dyn Database>(|database| database as InstancePtr<dyn Database>);

    // config values
    values.bind::<u16>(&base_container, "network.http_port", "port")?;
    values.bind::<String>(&base_container, "logging.log_path", "log_path")?;
    values.bind::<String>(&base_container, "database.database_url", "database_url")?;

    // core services
    base_container
        .register_type::<FileLogger>()
        .to_type::<dyn Logger>()?;
    base_container
        .register_type::<NoSqlDatabase>()
        .to_type::<dyn Database>()?;
    base_container
        .register_type::<SqlDatabase>()
        .to_name_as::<dyn Database, _>("legacy_db")?
        .with_params(Params::new().kwarg("database_url", "sqlite://legacy.db".to_string()))?;

    Ok(base_container)
}

fn create_comm_container() -> Result<Container, Box<dyn std::error::Error>> {
    let comm_container = Container::new("comm");
    comm_container.register_alias::<UdpCommProtocol, dyn CommProtocol>(|protocol| {
        protocol as InstancePtr<dyn CommProtocol>
    });
    comm_container.register_alias::<HttpCommProtocol, dyn CommProtocol>(|protocol| {
        protocol as InstancePtr<dyn CommProtocol>
    });

    comm_container
        .register_callable(GenericCommunicator::signature(), |arguments| {
            GenericCommunicator::construct("InternalCommunicator", arguments)
                .map(|communicator| InstancePtr::new(communicator) as InstancePtr<dyn Communicator>)
        })
        .to_name_as::<dyn Communicator, _>("internal_comm")?
        .with_name_bindings(NameBindings::new().kwarg("comm_protocol", "internal_protocol"))?;
    comm_container
        .register_callable(GenericCommunicator::signature(), |arguments| {
            GenericCommunicator::construct("ExternalCommunicator", arguments)
                .map(|communicator| InstancePtr::new(communicator) as InstancePtr<dyn Communicator>)
        })
        .to_name_as::<dyn Communicator, _>("external_comm")?
        .with_name_bindings(NameBindings::new().kwarg("comm_protocol", "external_protocol"))?;

    comm_container
        .register_type::<UdpCommProtocol>()
        .with_instantiation(Instantiation::MultiInstance)?
        .to_name_as::<dyn CommProtocol, _>("internal_protocol")?;
    comm_container
        .register_type::<HttpCommProtocol>()
        .with_instantiation(Instantiation::MultiInstance)?
        .to_name_as::<dyn CommProtocol, _>("external_protocol")?;

    Ok(comm_container)
}

fn create_main_container() -> Result<Container, Box<dyn std::error::Error>> {
    let main_container = Container::new("main");

    main_container
        .register_type::<MainManager>()
        .to_name("main_class")?
        .with_name_bindings(
            NameBindings::new()
                .kwarg("internal_communicator", "internal_comm")
                .kwarg("external_communicator", "external_comm"),
        )?;

    // the entry point runner, bound to the default entry point name
    main_container
        .register_callable(
            Signature::new()
                .param(Parameter::new("main_manager").typed::<MainManager>())
                .param(Parameter::new("num_of_jobs").typed::<u32>())
                .param(Parameter::new("job_type").typed::<String>()),
            |arguments| {
                Ok(InstancePtr::new(MainRunner {
                    main_manager: arguments.get("main_manager")?,
                    num_of_jobs: arguments.get("num_of_jobs")?,
                    job_type: arguments.get("job_type")?,
                }) as InstancePtr<dyn ApplicationRunner>)
            },
        )
        .to_name("main")?
        .with_params(
            Params::new()
                .kwarg("num_of_jobs", 3_u32)
                .kwarg("job_type", "-example-".to_string()),
        )?
        .with_name_bindings(NameBindings::new().kwarg("main_manager", "main_class"))?;

    Ok(main_container)
}

// note: for the sake of simplicity, errors are propagated to main, rather than gracefully handled
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // configuration values have defaults, which can be overridden with environment variables,
    // e.g. EXAMPLE_NETWORK__HTTP_PORT=8080
    let values = ConfigValues::new(
        Config::builder()
            .set_default("logging.log_path", "/var/log/example")?
            .set_default("network.http_port", 12345)?
            .set_default("database.database_url", "http://localhost:9999")?
            .add_source(Environment::with_prefix("EXAMPLE").separator("__"))
            .build()?,
    );

    let base_container = create_base_container(&values)?;
    let comm_container = create_comm_container()?;
    let main_container = create_main_container()?;

    // services in the base container are shared by both remaining containers
    comm_container.add_sub_container(&base_container)?;
    main_container.add_sub_container(&base_container)?;
    main_container.add_sub_container(&comm_container)?;

    // resolves the "main" runner and runs it
    Application::new(main_container, ApplicationConfig::default()).run()?;

    Ok(())
}
