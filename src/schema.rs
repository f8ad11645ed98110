//! Target schema of the plant-growth-experiment tracker.
//!
//! Every statement is written to be re-runnable: tables and sequences use
//! `IF NOT EXISTS`, foreign keys are guarded by a catalog probe in
//! [`crate::models::create_tables`] before they get added.

/// Provisioned tables, in dependency-free creation order.
pub const TABLES: [&str; 5] = ["client", "experiment", "packages", "plant", "plant_data"];

/// One `CREATE TABLE` per entry of [`TABLES`], same order.
pub const CREATE_TABLES: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS public.client (
        client_id smallint NOT NULL,
        rack_num smallint NOT NULL,
        row_num smallint NOT NULL,
        CONSTRAINT client_pk PRIMARY KEY (client_id),
        CONSTRAINT client_rack_row_un UNIQUE (rack_num, row_num)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS public.experiment (
        id integer NOT NULL,
        parameter json NOT NULL,
        name character varying NOT NULL,
        description text,
        CONSTRAINT experiment_pk PRIMARY KEY (id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS public.packages (
        client_id smallint NOT NULL,
        package integer NOT NULL,
        temperature_air numeric NOT NULL,
        humidity_air numeric NOT NULL,
        "time" timestamp without time zone NOT NULL,
        CONSTRAINT packages_pk PRIMARY KEY (client_id, package)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS public.plant (
        id bigint NOT NULL,
        experiment_id integer NOT NULL,
        pos numeric NOT NULL,
        client_id smallint NOT NULL,
        CONSTRAINT plant_pk PRIMARY KEY (id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS public.plant_data (
        plant_id bigint NOT NULL,
        date timestamp without time zone NOT NULL,
        path_to_photo character varying,
        temperature_ground numeric,
        package_id integer NOT NULL,
        humidity_ground numeric,
        illuminance integer,
        client_id smallint NOT NULL,
        CONSTRAINT plant_data_pk PRIMARY KEY (client_id, package_id, plant_id)
    );
    "#,
];

/// Id sequences and their column wiring. Must run after [`CREATE_TABLES`],
/// `OWNED BY` and `SET DEFAULT` need the owning table in place.
pub const CREATE_SEQUENCES: [&str; 6] = [
    "CREATE SEQUENCE IF NOT EXISTS public.experiment_id_seq AS integer",
    "ALTER SEQUENCE public.experiment_id_seq OWNED BY public.experiment.id",
    "ALTER TABLE ONLY public.experiment
        ALTER COLUMN id SET DEFAULT nextval('public.experiment_id_seq'::regclass)",
    "CREATE SEQUENCE IF NOT EXISTS public.plant_id_seq",
    "ALTER SEQUENCE public.plant_id_seq OWNED BY public.plant.id",
    "ALTER TABLE ONLY public.plant
        ALTER COLUMN id SET DEFAULT nextval('public.plant_id_seq'::regclass)",
];

pub struct ForeignKey {
    pub name: &'static str,
    pub table: &'static str,
    pub references: &'static str,
    pub ddl: &'static str,
}

/// Named foreign keys, added one by one after all tables exist.
pub const FOREIGN_KEYS: [ForeignKey; 5] = [
    ForeignKey {
        name: "packages_client_fk",
        table: "packages",
        references: "client",
        ddl: "ALTER TABLE ONLY public.packages
            ADD CONSTRAINT packages_client_fk FOREIGN KEY (client_id)
            REFERENCES public.client (client_id)",
    },
    ForeignKey {
        name: "plant_client_fk",
        table: "plant",
        references: "client",
        ddl: "ALTER TABLE ONLY public.plant
            ADD CONSTRAINT plant_client_fk FOREIGN KEY (client_id)
            REFERENCES public.client (client_id)",
    },
    ForeignKey {
        name: "plant_experiment_fk",
        table: "plant",
        references: "experiment",
        ddl: "ALTER TABLE ONLY public.plant
            ADD CONSTRAINT plant_experiment_fk FOREIGN KEY (experiment_id)
            REFERENCES public.experiment (id)",
    },
    ForeignKey {
        name: "plant_data_packages_fk",
        table: "plant_data",
        references: "packages",
        ddl: "ALTER TABLE ONLY public.plant_data
            ADD CONSTRAINT plant_data_packages_fk FOREIGN KEY (client_id, package_id)
            REFERENCES public.packages (client_id, package)",
    },
    ForeignKey {
        name: "plant_data_plant_fk",
        table: "plant_data",
        references: "plant",
        ddl: "ALTER TABLE ONLY public.plant_data
            ADD CONSTRAINT plant_data_plant_fk FOREIGN KEY (plant_id)
            REFERENCES public.plant (id)",
    },
];
